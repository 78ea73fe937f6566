//! TCP listener and connection dispatch.
//!
//! A fixed-size pool of worker threads pulls accepted connections off a
//! channel; each worker runs one connection's line loop to completion
//! before going back for the next one. This matches §5's "parallel OS
//! threads, no cooperative suspension" scheduling model: a worker blocks on
//! socket I/O and on facade lock acquisition, never yields cooperatively.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use log::{debug, error, info, warn};

use crate::fs::FileSystem;
use crate::protocol::{self, Command};

enum Response {
    Line(String),
    Raw(Vec<u8>),
    Quit,
}

/// Binds `bind_addr` and serves connections with `threads` workers until
/// the listener errors out or is closed.
pub fn run(fs: Arc<FileSystem>, bind_addr: &str, threads: usize) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr)?;
    info!("listening on {bind_addr}");

    let (tx, rx) = mpsc::channel::<TcpStream>();
    let rx = Arc::new(Mutex::new(rx));

    let workers: Vec<_> = (0..threads.max(1))
        .map(|id| {
            let fs = Arc::clone(&fs);
            let rx = Arc::clone(&rx);
            thread::spawn(move || worker_loop(id, &fs, &rx))
        })
        .collect();

    for incoming in listener.incoming() {
        match incoming {
            Ok(stream) => {
                if tx.send(stream).is_err() {
                    break;
                }
            }
            Err(e) => error!("failed to accept connection: {e}"),
        }
    }

    drop(tx);
    for worker in workers {
        if worker.join().is_err() {
            warn!("a worker thread panicked");
        }
    }
    Ok(())
}

fn worker_loop(id: usize, fs: &Arc<FileSystem>, rx: &Arc<Mutex<mpsc::Receiver<TcpStream>>>) {
    loop {
        let next = rx.lock().expect("connection queue mutex poisoned").recv();
        let Ok(stream) = next else { break };

        let peer = stream.peer_addr().ok();
        info!("worker {id}: connection accepted from {peer:?}");
        if let Err(e) = handle_connection(fs, stream) {
            error!("worker {id}: connection error: {e}");
        }
        info!("worker {id}: connection closed");
    }
}

fn handle_connection(fs: &FileSystem, stream: TcpStream) -> std::io::Result<()> {
    let mut writer = stream.try_clone()?;
    let reader = BufReader::new(stream);

    for line in reader.lines() {
        let line = line?;
        debug!("dispatch: {line:?}");
        match dispatch(fs, &line) {
            Response::Line(text) => {
                writer.write_all(text.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            Response::Raw(bytes) => {
                writer.write_all(&bytes)?;
                writer.write_all(b"\n")?;
            }
            Response::Quit => {
                writer.write_all(b"SUCCESS: Disconnecting.\n")?;
                break;
            }
        }
    }
    Ok(())
}

fn dispatch(fs: &FileSystem, line: &str) -> Response {
    let command = match protocol::parse_command(line) {
        Ok(command) => command,
        Err(e) => return Response::Line(protocol::protocol_error_response(&e)),
    };

    match command {
        Command::Create { name } => match fs.create(&name) {
            Ok(()) => Response::Line(protocol::create_success(&name)),
            Err(e) => Response::Line(protocol::fs_error_response(&e)),
        },
        Command::Write { name, content } => match fs.write(&name, &content) {
            Ok(()) => Response::Line(protocol::write_success(&name)),
            Err(e) => Response::Line(protocol::fs_error_response(&e)),
        },
        Command::Read { name } => match fs.read(&name) {
            Ok(bytes) => Response::Raw(bytes),
            Err(e) => Response::Line(protocol::fs_error_response(&e)),
        },
        Command::Delete { name } => match fs.delete(&name) {
            Ok(()) => Response::Line(protocol::delete_success(&name)),
            Err(e) => Response::Line(protocol::fs_error_response(&e)),
        },
        Command::List => Response::Line(protocol::list_response(&fs.list())),
        Command::Quit => Response::Quit,
    }
}
