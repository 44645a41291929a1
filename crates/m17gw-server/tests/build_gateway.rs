//! End-to-end test of the socket/config wiring in `GatewayServer::build`.
//! The event loop itself is exercised at the state-machine level by
//! `m17gw-core`'s own tests; this only checks that a real config on disk
//! produces real bound sockets and a driver in the expected initial state.

use std::io::Write;

use m17gw_core::GatewayConfig;
use m17gw_server::GatewayServer;
use tempfile::NamedTempFile;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn build_binds_sockets_and_loads_directory() {
    let hosts_json = write_temp(
        r#"{"reflectors": [{"designator": "USA", "port": 17000, "ipv4": "127.0.0.1", "ipv6": null}]}"#,
    );

    let config_text = format!(
        r#"
        [general]
        callsign = "N0CALL"
        rpt_address = "127.0.0.1"
        rpt_port = 0
        local_port = 0

        [network]
        port = 0
        hosts_file1 = "{}"
        hosts_file2 = ""
        "#,
        hosts_json.path().display()
    );
    let config_file = write_temp(&config_text);

    let config = GatewayConfig::load(config_file.path().to_str().unwrap()).unwrap();
    let (server, actions) = GatewayServer::build(config).unwrap();

    // No startup reflector was configured, so the driver stays NotLinked and
    // only the repeater link's initial PING action comes back.
    assert!(actions
        .iter()
        .any(|a| matches!(a, m17gw_core::GatewayAction::SendToModem(bytes) if &bytes[0..4] == b"PING")));
    drop(server);
}
