//! Help text for c8run

use std::io::{self, Write};

pub fn print_help() -> io::Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let help_text = format!(
        r#"
c8run v{version} - run Camunda 8 locally

USAGE:
    c8run <COMMAND> [OPTIONS]

COMMANDS:
    start       Start Elasticsearch, Connectors and Camunda
    stop        Stop every service started by a previous 'start'
    clean       Remove logs, pid files and extracted distributions
    package     Build a distribution archive (not supported by this launcher)

OPTIONS:
    --config <path>     Applies the specified Spring configuration file,
                        relative to the c8run directory
    --detached          Starts Camunda Run as a detached process
    -h, --help          Print this help
    -V, --version       Print version

ENVIRONMENT:
    JAVA_HOME           JDK to use; otherwise 'java' is looked up on PATH
    JAVA_VERSION        Skip the 'java --version' probe and use this version
    JAVA_OPTS           Extra JVM options, echoed at start
    CAMUNDA_VERSION     Camunda distribution version to launch
    RUST_LOG            Diagnostic log filter (default: info)
"#
    );

    let mut stdout = io::stdout().lock();
    stdout.write_all(help_text.as_bytes())?;
    stdout.flush()
}
