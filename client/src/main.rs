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

/* Cray XD system firmware update client
 *
 * USAGE: ./xdfw -H 10.153.145.103 -U TheBMCUsername -P TheBMCPassword \
 *          -C Update -c SystemFirmwareUpdate --image-xd220v /fwrepo/xd220v.hpm
 * -H: IP address of the BMC's Redfish API. Should be HTTPS on port 443.
 * Run with `-h` for help.
 * Run with `-v` for more output.
 *
 * Prints {"msg": ...} on stdout: the success message with exit code 0, or
 * the failure text with exit code 1. Bad usage exits 2 without touching the
 * network.
 */

use std::process::ExitCode;
use std::time::Duration;

use libxdfw::{
    run, Credentials, HttpFirmwareClient, RunMode, ServerModel, UpdateError, UpdateRequest,
};
use serde_json::json;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::prelude::*;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let mut opts = getopts::Options::new();

    opts.optflag("h", "help", "Print this help");
    opts.optflag("v", "verbose", "Log at DEBUG level. Default is INFO");
    opts.optflag(
        "",
        "check",
        "Dry-run mode. Always refused, a firmware update cannot be simulated",
    );
    opts.optopt(
        "C",
        "category",
        "Required. Operation category, e.g. Update",
        "CATEGORY",
    );
    opts.optmulti(
        "c",
        "command",
        "Required. Command to run, e.g. SystemFirmwareUpdate. Repeatable",
        "CMD",
    );
    opts.optopt(
        "H",
        "baseuri",
        "Required. Hostname or IP address of BMC Redfish API",
        "HOST",
    );
    opts.optopt("U", "username", "BMC username", "USER");
    opts.optopt("P", "password", "BMC password", "PASS");
    opts.optopt(
        "T",
        "auth-token",
        "BMC auth token, instead of username/password",
        "TOKEN",
    );
    opts.optopt("", "timeout", "HTTP timeout in seconds. Default 60", "SECS");
    opts.optopt("", "image-type", "Firmware bundle format. Default HPM", "TYPE");
    opts.optmulti(
        "r",
        "resource-id",
        "Member of /redfish/v1/Systems to update. Repeatable",
        "ID",
    );
    opts.optopt(
        "",
        "update-target",
        "Redfish Targets entry for SimpleUpdate",
        "URI",
    );
    opts.optopt(
        "",
        "power-state",
        "Power state the host should be in when the update lands",
        "STATE",
    );
    opts.optopt("", "image-xd220v", "Firmware image path for XD220v systems", "PATH");
    opts.optopt("", "image-xd225v", "Firmware image path for XD225v systems", "PATH");
    opts.optopt("", "image-xd295v", "Firmware image path for XD295v systems", "PATH");
    opts.optopt("", "image-xd665", "Firmware image path for XD665 systems", "PATH");
    opts.optopt("", "image-xd670", "Firmware image path for XD670 systems", "PATH");
    opts.optopt(
        "",
        "output-file",
        "Where the remote service should write its update report",
        "NAME",
    );

    let usage =
        "xdfw -H bmc_ip -U bmc_user -P bmc_pass -C Update -c SystemFirmwareUpdate [options]";
    let args_given = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{}", opts.usage(usage));
            return ExitCode::from(2);
        }
    };
    if args_given.opt_present("h") {
        println!("{}", opts.usage(usage));
        return ExitCode::SUCCESS;
    }
    if !args_given.opt_present("H") || !args_given.opt_present("C") || !args_given.opt_present("c")
    {
        eprintln!("{}", opts.usage(usage));
        return ExitCode::from(2);
    }
    let timeout = match args_given.opt_str("timeout") {
        Some(s) => match s.parse::<u64>() {
            Ok(secs) => Some(Duration::from_secs(secs)),
            Err(_) => {
                eprintln!("--timeout wants a whole number of seconds, got '{s}'");
                return ExitCode::from(2);
            }
        },
        None => None,
    };
    let mode = if args_given.opt_present("check") {
        RunMode::Check
    } else {
        RunMode::Normal
    };

    let log_level = if args_given.opt_present("v") {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(log_level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("reqwest=warn".parse().unwrap())
        .add_directive("rustls=warn".parse().unwrap());
    tracing_subscriber::registry()
        .with(Layer::default().compact())
        .with(env_filter)
        .init();

    match run_update(&args_given, mode, timeout) {
        Ok(msg) => {
            println!("{}", json!({ "msg": msg }));
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", json!({ "msg": e.to_string() }));
            ExitCode::FAILURE
        }
    }
}

fn run_update(
    args: &getopts::Matches,
    mode: RunMode,
    timeout: Option<Duration>,
) -> Result<String, UpdateError> {
    let baseuri = args.opt_str("H").unwrap();
    let category = args.opt_str("C").unwrap();
    let commands = args.opt_strs("c");

    let credentials = Credentials::new(args.opt_str("U"), args.opt_str("P"), args.opt_str("T"))?;

    let mut builder = UpdateRequest::builder(&baseuri);
    if let Some(username) = args.opt_str("U") {
        builder = builder.username(&username);
    }
    if let Some(password) = args.opt_str("P") {
        builder = builder.password(&password);
    }
    if let Some(image_type) = args.opt_str("image-type") {
        builder = builder.update_image_type(&image_type);
    }
    if let Some(target) = args.opt_str("update-target") {
        builder = builder.update_target(&target);
    }
    if let Some(power_state) = args.opt_str("power-state") {
        builder = builder.power_state(&power_state);
    }
    if let Some(path) = args.opt_str("image-xd220v") {
        builder = builder.image_path(ServerModel::Xd220v, &path);
    }
    if let Some(path) = args.opt_str("image-xd225v") {
        builder = builder.image_path(ServerModel::Xd225v, &path);
    }
    if let Some(path) = args.opt_str("image-xd295v") {
        builder = builder.image_path(ServerModel::Xd295v, &path);
    }
    if let Some(path) = args.opt_str("image-xd665") {
        builder = builder.image_path(ServerModel::Xd665, &path);
    }
    if let Some(path) = args.opt_str("image-xd670") {
        builder = builder.image_path(ServerModel::Xd670, &path);
    }
    if let Some(name) = args.opt_str("output-file") {
        builder = builder.output_file_name(&name);
    }
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    let resource_ids = args.opt_strs("r");
    if !resource_ids.is_empty() {
        builder = builder.resource_id(resource_ids);
    }
    let request = builder.build();

    let client = HttpFirmwareClient::builder().build()?;
    run(mode, &category, &commands, &credentials, &request, &client)
}
