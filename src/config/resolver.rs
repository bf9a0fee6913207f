//! Precedence resolution: default < file < environment < CLI.
//!
//! The container-name switch is applied last and overrides every other
//! instance-id source.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::cli::Cli;
use crate::config::env::Environment;
use crate::config::loader::{load_config, resolve_config_path, ConfigError};
use crate::config::schema::{FileConfig, Settings};
use crate::config::validation::validate_settings;
use crate::host::HostIdentity;

pub const DEFAULT_CONFIG_PATH: &str = "./service.toml";
pub const DEFAULT_CONSUL: &str = "localhost:8500";
pub const DEFAULT_INSTANCE_ID: &str = "1";
pub const DEFAULT_REST_PORT: u16 = 8880;
pub const DEFAULT_GRPC_PORT: u16 = 50055;

/// Built-in defaults, including the host lookups they depend on.
#[derive(Debug, Clone, PartialEq)]
pub struct Defaults {
    pub config: PathBuf,
    pub consul: String,
    pub instance_id: String,
    pub interface: String,
    pub internal_host_address: String,
    pub external_host_address: String,
    pub rest_port: u16,
    pub grpc_port: u16,
}

impl Defaults {
    /// Query the host once for the address and interface defaults.
    pub fn discover(host: &dyn HostIdentity) -> Self {
        let address = host.primary_local_ipv4();
        Self {
            config: PathBuf::from(DEFAULT_CONFIG_PATH),
            consul: DEFAULT_CONSUL.to_string(),
            instance_id: DEFAULT_INSTANCE_ID.to_string(),
            interface: host.primary_interface(),
            internal_host_address: address.clone(),
            external_host_address: address,
            rest_port: DEFAULT_REST_PORT,
            grpc_port: DEFAULT_GRPC_PORT,
        }
    }
}

/// Highest layer that supplied a value wins. `arg` is the parsed flag,
/// which already carries its environment variable.
fn pick<T>(arg: Option<T>, file: Option<T>, default: T) -> T {
    arg.or(file).unwrap_or(default)
}

/// Resolve settings from every source.
///
/// `install_dir` anchors a relative config path.
pub fn resolve(
    cli: &Cli,
    env: &Environment,
    host: &dyn HostIdentity,
    install_dir: &Path,
) -> Result<Settings, ConfigError> {
    let defaults = Defaults::discover(host);
    resolve_with(cli, env, host, &defaults, install_dir)
}

/// [`resolve`] with explicit defaults.
pub fn resolve_with(
    cli: &Cli,
    env: &Environment,
    host: &dyn HostIdentity,
    defaults: &Defaults,
    install_dir: &Path,
) -> Result<Settings, ConfigError> {
    let (config_path, file) = load_file(cli, defaults, install_dir)?;

    let mut instance_id = pick(
        cli.instance_id.clone().or_else(|| env.hostname.clone()),
        file.instance_id.clone(),
        defaults.instance_id.clone(),
    );
    if cli.instance_id_is_container_name {
        instance_id = host.container_name().map_err(ConfigError::ContainerName)?;
    }

    let mut logging = file.logging.clone();
    logging.filter_override = env.rust_log.clone();

    let settings = Settings {
        config_path,
        instance_id,
        consul: pick(
            cli.consul.clone(),
            file.consul.clone(),
            defaults.consul.clone(),
        ),
        external_host_address: pick(
            cli.external_host_address.clone(),
            file.external_host_address.clone(),
            defaults.external_host_address.clone(),
        ),
        internal_host_address: pick(
            cli.internal_host_address.clone(),
            file.internal_host_address.clone(),
            defaults.internal_host_address.clone(),
        ),
        interface: pick(
            cli.interface.clone(),
            file.interface.clone(),
            defaults.interface.clone(),
        ),
        fluentd: cli.fluentd.clone().or_else(|| file.fluentd.clone()),
        rest_port: pick(cli.rest_port, file.rest_port, defaults.rest_port),
        grpc_port: pick(cli.grpc_port, file.grpc_port, defaults.grpc_port),
        verbosity: cli.verbosity(),
        heartbeat_enabled: !cli.no_heartbeat,
        heartbeat_interval: Duration::from_secs(file.heartbeat.interval_secs),
        banner: !cli.no_banner,
        shutdown_timeout: Duration::from_secs(file.lifecycle.shutdown_timeout_secs),
        logging,
    };

    validate_settings(&settings).map_err(ConfigError::Validation)?;
    Ok(settings)
}

/// Find and load the config file.
///
/// An explicitly supplied path must load. A missing default file means
/// "no file"; a default file that exists but is broken is still fatal.
fn load_file(
    cli: &Cli,
    defaults: &Defaults,
    install_dir: &Path,
) -> Result<(Option<PathBuf>, FileConfig), ConfigError> {
    let explicit = cli.config.clone();
    let is_explicit = explicit.is_some();
    let path = resolve_config_path(
        &explicit.unwrap_or_else(|| defaults.config.clone()),
        install_dir,
    );

    if !is_explicit && !path.exists() {
        tracing::warn!(path = %path.display(), "Default config file not found, using built-in defaults");
        return Ok((None, FileConfig::default()));
    }
    let file = load_config(&path)?;
    Ok((Some(path), file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::tests::{parse, parse_with_env};
    use crate::host::HostError;
    use serial_test::serial;
    use std::io::Write;

    struct FakeHost {
        container: Option<&'static str>,
    }

    impl HostIdentity for FakeHost {
        fn primary_interface(&self) -> String {
            "ens5".to_string()
        }

        fn primary_local_ipv4(&self) -> String {
            "10.0.0.7".to_string()
        }

        fn container_name(&self) -> Result<String, HostError> {
            self.container
                .map(str::to_string)
                .ok_or(HostError::NoContainerId)
        }
    }

    const HOST: FakeHost = FakeHost {
        container: Some("host_service_1"),
    };

    fn cli(args: &[&str]) -> Cli {
        parse(args).unwrap()
    }

    fn cli_env(args: &[&str], vars: &[(&str, &str)]) -> Cli {
        parse_with_env(args, vars).unwrap()
    }

    /// Install dir containing `service.toml` with `contents`.
    fn install_dir_with(contents: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("service.toml")).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        dir
    }

    fn resolve_in(dir: &Path, cli: &Cli) -> Result<Settings, ConfigError> {
        resolve(cli, &Environment::default(), &HOST, dir)
    }

    #[test]
    #[serial(env)]
    fn test_rest_port_precedence_scenario() {
        let dir = install_dir_with("rest_port = 9000\n");

        let both = cli_env(&["--rest-port", "6000"], &[("REST_PORT", "7000")]);
        assert_eq!(resolve_in(dir.path(), &both).unwrap().rest_port, 6000);

        let env_only = cli_env(&[], &[("REST_PORT", "7000")]);
        assert_eq!(resolve_in(dir.path(), &env_only).unwrap().rest_port, 7000);

        let settings = resolve_in(dir.path(), &cli(&[])).unwrap();
        assert_eq!(settings.rest_port, 9000);

        let bare = install_dir_with("[logging]\nlevel = \"info\"\n");
        let settings = resolve_in(bare.path(), &cli(&[])).unwrap();
        assert_eq!(settings.rest_port, DEFAULT_REST_PORT);
    }

    #[test]
    #[serial(env)]
    fn test_every_layer_combination_for_consul() {
        let no_file = tempfile::tempdir().unwrap();
        for use_cli in [false, true] {
            for use_env in [false, true] {
                let args: Vec<&str> = if use_cli { vec!["-C", "cli:1"] } else { vec![] };
                let vars: Vec<(&str, &str)> = if use_env { vec![("CONSUL", "env:2")] } else { vec![] };

                let settings = resolve_in(no_file.path(), &cli_env(&args, &vars)).unwrap();
                let expected = match (use_cli, use_env) {
                    (true, _) => "cli:1",
                    (false, true) => "env:2",
                    (false, false) => DEFAULT_CONSUL,
                };
                assert_eq!(settings.consul, expected, "cli={use_cli} env={use_env}");
            }
        }
    }

    #[test]
    #[serial(env)]
    fn test_host_lookups_feed_defaults() {
        let no_file = tempfile::tempdir().unwrap();
        let settings = resolve_in(no_file.path(), &cli(&[])).unwrap();
        assert_eq!(settings.interface, "ens5");
        assert_eq!(settings.internal_host_address, "10.0.0.7");
        assert_eq!(settings.external_host_address, "10.0.0.7");
        assert_eq!(settings.grpc_port, DEFAULT_GRPC_PORT);
        assert_eq!(settings.config_path, None);
    }

    #[test]
    #[serial(env)]
    fn test_instance_id_falls_back_to_hostname() {
        let no_file = tempfile::tempdir().unwrap();
        let env = Environment {
            hostname: Some("3f2a".to_string()),
            ..Environment::default()
        };

        let settings = resolve(&cli(&[]), &env, &HOST, no_file.path()).unwrap();
        assert_eq!(settings.instance_id, "3f2a");

        let with_id = cli_env(&[], &[("INSTANCE_ID", "node-2")]);
        let settings = resolve(&with_id, &env, &HOST, no_file.path()).unwrap();
        assert_eq!(settings.instance_id, "node-2");

        let settings = resolve_in(no_file.path(), &cli(&[])).unwrap();
        assert_eq!(settings.instance_id, DEFAULT_INSTANCE_ID);
    }

    #[test]
    #[serial(env)]
    fn test_container_name_overrides_all_instance_id_sources() {
        let dir = install_dir_with("instance_id = \"from-file\"\n");

        let flagged = cli_env(
            &["-i", "from-cli", "--instance-id-is-container-name"],
            &[("INSTANCE_ID", "from-env")],
        );
        assert_eq!(resolve_in(dir.path(), &flagged).unwrap().instance_id, "host_service_1");

        let from_env = cli_env(
            &["-i", "from-cli"],
            &[("INSTANCE_ID", "from-env"), ("INSTANCE_ID_IS_CONTAINER_NAME", "true")],
        );
        assert_eq!(resolve_in(dir.path(), &from_env).unwrap().instance_id, "host_service_1");
    }

    #[test]
    #[serial(env)]
    fn test_container_lookup_failure_is_fatal() {
        let no_file = tempfile::tempdir().unwrap();
        let host = FakeHost { container: None };
        let err = resolve(
            &cli(&["--instance-id-is-container-name"]),
            &Environment::default(),
            &host,
            no_file.path(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ContainerName(_)));
    }

    #[test]
    #[serial(env)]
    fn test_explicit_missing_config_is_fatal() {
        let no_file = tempfile::tempdir().unwrap();

        let err = resolve_in(no_file.path(), &cli(&["-c", "missing.toml"])).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let from_env = cli_env(&[], &[("CONFIG", "missing.toml")]);
        let err = resolve_in(no_file.path(), &from_env).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    #[serial(env)]
    fn test_broken_default_config_is_fatal() {
        let dir = install_dir_with("rest_port = [");
        let err = resolve_in(dir.path(), &cli(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    #[serial(env)]
    fn test_relative_config_resolved_against_install_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("conf")).unwrap();
        std::fs::write(dir.path().join("conf/alt.toml"), "grpc_port = 50100\n").unwrap();

        let settings = resolve_in(dir.path(), &cli(&["-c", "conf/alt.toml"])).unwrap();
        assert_eq!(settings.grpc_port, 50100);
        assert_eq!(settings.config_path, Some(dir.path().join("conf/alt.toml")));
    }

    #[test]
    #[serial(env)]
    fn test_switches_and_sections() {
        let dir = install_dir_with(
            "[heartbeat]\ninterval_secs = 3\n[lifecycle]\nshutdown_timeout_secs = 5\n",
        );

        let switched = cli_env(&["-N", "-vv"], &[("NO_BANNER", "1")]);
        let settings = resolve_in(dir.path(), &switched).unwrap();
        assert!(!settings.heartbeat_enabled);
        assert!(!settings.banner);
        assert_eq!(settings.verbosity, 2);
        assert_eq!(settings.heartbeat_interval, Duration::from_secs(3));
        assert_eq!(settings.shutdown_timeout, Duration::from_secs(5));

        let settings = resolve_in(dir.path(), &cli_env(&[], &[("NO_HEARTBEAT", "false")])).unwrap();
        assert!(settings.heartbeat_enabled);
        assert!(settings.banner);
    }

    #[test]
    #[serial(env)]
    fn test_fluentd_from_file_when_not_overridden() {
        let dir = install_dir_with("fluentd = \"fluentd:24224\"\n");
        let settings = resolve_in(dir.path(), &cli(&[])).unwrap();
        assert_eq!(settings.fluentd.as_deref(), Some("fluentd:24224"));

        let settings = resolve_in(dir.path(), &cli(&["-F", "collector:24224"])).unwrap();
        assert_eq!(settings.fluentd.as_deref(), Some("collector:24224"));
    }

    #[test]
    #[serial(env)]
    fn test_rust_log_captured_into_logging() {
        let no_file = tempfile::tempdir().unwrap();
        let env = Environment {
            rust_log: Some("trace".to_string()),
            ..Environment::default()
        };
        let settings = resolve(&cli(&[]), &env, &HOST, no_file.path()).unwrap();
        assert_eq!(settings.logging.filter_override.as_deref(), Some("trace"));
    }

    #[test]
    #[serial(env)]
    fn test_validation_errors() {
        let no_file = tempfile::tempdir().unwrap();
        let err = resolve_in(no_file.path(), &cli(&["-R", "50055"])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
