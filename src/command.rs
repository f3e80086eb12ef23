/*
 * SPDX-License-Identifier: MIT
 *
 * Permission is hereby granted, free of charge, to any person obtaining a
 * copy of this software and associated documentation files (the "Software"),
 * to deal in the Software without restriction, including without limitation
 * the rights to use, copy, modify, merge, publish, distribute, sublicense,
 * and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
 * THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
 * FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
 * DEALINGS IN THE SOFTWARE.
 */
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::UpdateError;

/// Operation categories the updater knows how to dispatch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, clap::ValueEnum)]
pub enum Category {
    Update,
}

/// Operations grouped under a [`Category`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, clap::ValueEnum)]
pub enum Command {
    SystemFirmwareUpdate,
}

/// Which commands each category accepts. More will be added as the update
/// feature set grows.
pub const CATEGORY_COMMANDS: &[(Category, &[Command])] =
    &[(Category::Update, &[Command::SystemFirmwareUpdate])];

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Category {
    /// Commands this category accepts.
    pub fn commands(self) -> &'static [Command] {
        CATEGORY_COMMANDS
            .iter()
            .find(|(category, _)| *category == self)
            .map(|(_, commands)| *commands)
            .unwrap_or(&[])
    }

    pub fn command_names(self) -> Vec<String> {
        self.commands().iter().map(Command::to_string).collect()
    }

    /// Names of every registered category.
    pub fn names() -> Vec<String> {
        CATEGORY_COMMANDS
            .iter()
            .map(|(category, _)| category.to_string())
            .collect()
    }
}

impl FromStr for Category {
    type Err = UpdateError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Update" => Ok(Category::Update),
            x => Err(UpdateError::InvalidCategory(x.to_string())),
        }
    }
}

/// Check a category name and its command list against the registry.
///
/// Fails if even one command given is invalid, so a partially valid list never
/// reaches the dispatcher.
pub fn validate(
    category: &str,
    commands: &[String],
) -> Result<(Category, Vec<Command>), UpdateError> {
    let category: Category = category.parse()?;
    let mut validated = Vec::with_capacity(commands.len());
    for cmd in commands {
        let command = category
            .commands()
            .iter()
            .find(|c| c.to_string() == *cmd)
            .copied()
            .ok_or_else(|| UpdateError::InvalidCommand {
                category,
                command: cmd.clone(),
            })?;
        validated.push(command);
    }
    Ok((category, validated))
}

#[cfg(test)]
mod tests {
    use super::*;

    // test_validate_update tests the single registered category/command pair.
    #[test]
    fn test_validate_update() {
        let (category, commands) =
            validate("Update", &["SystemFirmwareUpdate".to_string()]).unwrap();
        assert_eq!(category, Category::Update);
        assert_eq!(commands, vec![Command::SystemFirmwareUpdate]);
    }

    // test_invalid_category tests that the error lists every registered category.
    #[test]
    fn test_invalid_category() {
        let err = validate("Chassis", &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid Category 'Chassis'. Valid Categories = [\"Update\"]"
        );
    }

    // test_invalid_command tests that the first offending command is the one
    // reported, even when later commands are also bad.
    #[test]
    fn test_invalid_command() {
        let err = validate(
            "Update",
            &[
                "SystemFirmwareUpdate".to_string(),
                "GetFirmwareInventory".to_string(),
                "PowerCycle".to_string(),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid Command 'GetFirmwareInventory'. Valid Commands = [\"SystemFirmwareUpdate\"]"
        );
    }

    #[test]
    fn test_category_names() {
        assert_eq!(Category::names(), vec!["Update".to_string()]);
    }
}
