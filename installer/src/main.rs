//! ISPC setup CLI entrypoint.
//!
//! Resolves, downloads, verifies and exposes an ISPC compiler release for
//! later CI steps. Failures are reported as workflow error commands.

use clap::Parser;
use setup_ispc::artefact::download::UreqTransport;
use setup_ispc::artefact::extraction::ArchiveUnpacker;
use setup_ispc::cli::Cli;
use setup_ispc::error::Result;
use setup_ispc::git::git_executor;
use setup_ispc::output::{
    dry_run_text, export_bin_dir, failure_annotation, success_message, write_stderr_line,
};
use setup_ispc::pipeline::{SetupServices, plan_setup, run_setup};
use setup_ispc::process::SystemCommandExecutor;
use setup_ispc::release::host::HostInfo;
use std::io::Write;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stdout);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    let config = cli.setup_config()?;
    let request = cli.release_request();

    let transport = UreqTransport::new(config.network_timeout);
    let tool_runner = SystemCommandExecutor::with_timeout(config.process_timeout);
    let git = git_executor();
    let services = SetupServices {
        transport: &transport,
        extractor: &ArchiveUnpacker,
        tool_runner: &tool_runner,
        git: &git,
        host: HostInfo::current(),
    };

    // Dry-run mode: resolve and locate only
    if cli.dry_run {
        let plan = plan_setup(&config, &request, &services)?;
        write_stderr_line(stderr, dry_run_text(&plan));
        return Ok(());
    }

    let toolchain = run_setup(&config, &request, &services, stdout, stderr)?;
    export_bin_dir(toolchain.bin_dir(), cli.github_path(), stderr)?;
    write_stdout_line(stdout, success_message(toolchain.version().as_str()));
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stdout: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stdout_line(stdout, failure_annotation(&err));
            1
        }
    }
}

fn write_stdout_line(stdout: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stdout, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}
