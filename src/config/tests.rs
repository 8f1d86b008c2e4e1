use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_produce_a_local_listener() {
    let raw = RawSettings::default();
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:3000");
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(
        settings.database.max_connections.get(),
        DEFAULT_DB_MAX_CONNECTIONS
    );
    assert!(settings.database.url.is_none());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn blank_database_url_reads_as_unset() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn zero_pool_size_is_rejected() {
    let mut raw = RawSettings::default();
    raw.database.max_connections = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero pool size");
    assert!(matches!(err, LoadError::Invalid { key, .. } if key == "database.max_connections"));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["brezza"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "brezza",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "sqlite://override.db",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database_url.as_deref(),
                Some("sqlite://override.db")
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_add_user_arguments() {
    let args = CliArgs::parse_from([
        "brezza",
        "add-user",
        "leo",
        "--password",
        "hunter2",
        "--database-url",
        "sqlite://cli.db",
    ]);

    match args.command.expect("add-user command") {
        Command::AddUser(add) => {
            assert_eq!(add.username, "leo");
            assert_eq!(add.password, "hunter2");
            assert_eq!(
                add.database.database_url.as_deref(),
                Some("sqlite://cli.db")
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_add_group_arguments() {
    let args = CliArgs::parse_from([
        "brezza",
        "add-group",
        "Field notes",
        "--description",
        "Observations from the field",
    ]);

    match args.command.expect("add-group command") {
        Command::AddGroup(add) => {
            assert_eq!(add.title, "Field notes");
            assert_eq!(add.description, "Observations from the field");
            assert!(add.database.database_url.is_none());
        }
        _ => panic!("wrong command parsed"),
    }
}
