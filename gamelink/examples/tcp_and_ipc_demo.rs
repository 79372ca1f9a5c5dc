//! Demonstrates both transports with the same endpoint API.
//!
//! A local (Unix domain) and a TCP listener are created, a client connects
//! to each, sends a request and reads the echoed reply. The server side uses
//! non-blocking mode plus readiness polling.
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run --example tcp_and_ipc_demo
//! ```

use gamelink::prelude::*;
use std::thread;

fn echo_once(listener: Endpoint) -> Result<(), SocketError> {
    let mut conn = listener.accept()?;
    conn.set_nonblocking()?;

    loop {
        if !conn.is_readable(500) {
            continue;
        }
        match conn.receive(DEFAULT_BUFFER_SIZE) {
            Ok(data) if data.is_empty() => return Ok(()),
            Ok(data) => {
                let mut rest = &data[..];
                while !rest.is_empty() {
                    match conn.send(rest) {
                        Ok(n) => rest = &rest[n..],
                        Err(SocketError::WouldBlock) => {
                            conn.is_writable(500);
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
            Err(SocketError::WouldBlock) => {}
            Err(e) => return Err(e),
        }
    }
}

fn demo(addr: &Address) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}:", addr);
    let listener = Endpoint::create_listener(addr, &EndpointOptions::default())?;
    let server = thread::spawn(move || echo_once(listener));

    let mut client = Endpoint::connect_with(addr, &EndpointOptions::new().with_timeout(2))?;
    client.send_all(b"ps5 status?")?;
    let mut reply = [0u8; 11];
    let n = client.receive_exact(&mut reply)?;
    println!("   echoed {:?}", String::from_utf8_lossy(&reply[..n]));
    client.close();

    server.join().expect("server thread panicked")?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    gamelink::logging::init_from_env();

    let path = std::env::temp_dir().join("gamelink_demo.sock");
    demo(&Address::local(&path)?)?;
    let _ = std::fs::remove_file(&path);

    demo(&Address::resolve(Transport::Remote, "127.0.0.1:5555")?)?;
    Ok(())
}
