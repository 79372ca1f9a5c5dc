//! Startup flow: configuration -> settings -> endpoints.

use gamelink::prelude::*;
use std::time::Duration;

fn config_for(path: &std::path::Path, port: u16) -> MemoryConfig {
    let config = MemoryConfig::new();
    let keys = SettingsKeys::default();
    config.set(&keys.socket_path, &path.display().to_string()).unwrap();
    config.set_int(&keys.port, i64::from(port)).unwrap();
    config.set_int(&keys.timeout, 2).unwrap();
    config
}

#[test]
fn test_configured_local_listener() {
    let path = std::env::temp_dir().join(format!("gamelink-settings-{}.sock", std::process::id()));
    let port = portpicker::pick_unused_port().expect("no free port");
    let config = config_for(&path, port);

    let settings = TransportSettings::load(&config, &SettingsKeys::default()).unwrap();
    assert_eq!(settings.timeout_secs, 2);

    let addr = settings.local_address().unwrap();
    let listener = Endpoint::create_listener(&addr, &settings.endpoint_options()).unwrap();
    assert_eq!(listener.timeout(), Some(Duration::from_secs(2)));

    let client = Endpoint::connect_with(&addr, &settings.endpoint_options()).unwrap();
    let server = listener.accept().unwrap();

    client.send_all(b"status?").unwrap();
    assert!(server.is_readable(1000));
    assert_eq!(&server.receive(DEFAULT_BUFFER_SIZE).unwrap()[..], b"status?");

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_configured_tcp_listener() {
    let path = std::env::temp_dir().join(format!("gamelink-settings-tcp-{}.sock", std::process::id()));
    let port = portpicker::pick_unused_port().expect("no free port");
    let config = config_for(&path, port);
    let settings = TransportSettings::load(&config, &SettingsKeys::default()).unwrap();

    // Listeners bind the wildcard interface whatever host is given.
    let listen_addr = settings.remote_address("0.0.0.0").unwrap();
    let listener = Endpoint::create_listener(&listen_addr, &settings.endpoint_options()).unwrap();

    let client = Endpoint::connect(&settings.remote_address("127.0.0.1").unwrap()).unwrap();
    let server = listener.accept().unwrap();
    assert_eq!(server.role(), Role::Connected);

    server.send_all(b"ON").unwrap();
    let mut buf = [0u8; 2];
    assert_eq!(client.receive_exact(&mut buf).unwrap(), 2);
    assert_eq!(&buf, b"ON");
}

#[test]
fn test_log_config_from_same_source() {
    let config = MemoryConfig::with_entries([(("gaming", "core", "log_level"), "warning")]);
    let log = LogConfig::new("gaming-client")
        .with_target(LogTarget::Both)
        .load_level(&config, &ConfigKey::new("gaming", "core", "log_level"))
        .unwrap();

    assert_eq!(log.level, LogLevel::Warn);
    assert_eq!(log.ident, "gaming-client");
    tracing::subscriber::with_default(log.subscriber(), || {
        assert!(tracing::enabled!(tracing::Level::WARN));
        assert!(!tracing::enabled!(tracing::Level::INFO));
    });
}

#[derive(Clone, Default)]
struct Captured(std::sync::Arc<std::sync::Mutex<Vec<(LogLevel, String)>>>);

impl gamelink::system_log::SyslogWriter for Captured {
    fn write(&mut self, level: LogLevel, message: &str) -> std::io::Result<()> {
        self.0.lock().unwrap().push((level, message.to_string()));
        Ok(())
    }
}

#[test]
fn test_listener_creation_logged_at_info() {
    let captured = Captured::default();
    let log = LogConfig::new("gaming")
        .with_level(LogLevel::Info)
        .with_target(LogTarget::Syslog);
    let subscriber =
        log.subscriber_with(Some(gamelink::system_log::SyslogLayer::new(captured.clone())));

    let port = portpicker::pick_unused_port().expect("no free port");
    let addr = Address::remote("127.0.0.1", u32::from(port)).unwrap();
    let _listener = tracing::subscriber::with_default(subscriber, || {
        Endpoint::create_listener(&addr, &EndpointOptions::default()).unwrap()
    });

    let lines = captured.0.lock().unwrap().clone();
    assert!(
        lines
            .iter()
            .any(|(level, msg)| *level == LogLevel::Info && msg.contains("Listening on")),
        "{lines:?}"
    );
}
