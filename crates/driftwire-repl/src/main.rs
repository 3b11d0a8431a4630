//! Interactive command-line client for a Driftwire server.
//!
//! Connects over a newline-delimited TCP stream (one JSON frame per
//! line), spawns a reader thread as the transport delivery context, and
//! loops on stdin issuing synchronous `call` / `sub` requests. Classified
//! protocol events are printed to stderr as they arrive.
#![forbid(unsafe_code)]
#![allow(clippy::print_stderr)]

use std::{
    error::Error,
    io::{self, BufRead, BufReader, IsTerminal, Write},
    net::TcpStream,
    sync::{Arc, Mutex, PoisonError},
    thread,
};

use clap::Parser;
use driftwire_client::{
    Client, ClientConfig, ClientEvent, CollectionChange, EventSink, Transport, TransportError,
    WaitOutcome,
};
use driftwire_repl::{Command, commands};
use tracing_subscriber::EnvFilter;

/// A command-line tool for communicating with a Driftwire server.
#[derive(Debug, Parser)]
struct Args {
    /// Server endpoint to connect to, e.g. example.com:3000.
    endpoint: String,

    /// Print raw wire traffic in addition to classified events.
    #[arg(long)]
    print_raw: bool,
}

/// Newline-delimited TCP transport adapter: one JSON frame per line.
struct LineTransport {
    writer: Mutex<TcpStream>,
}

impl Transport for LineTransport {
    fn send(&self, text: &str) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer
            .write_all(text.as_bytes())
            .and_then(|()| writer.write_all(b"\n"))
            .and_then(|()| writer.flush())
            .map_err(|error| TransportError::new(error.to_string()))
    }
}

/// Prints classified events to stderr as they arrive.
struct PrintSink;

impl EventSink for PrintSink {
    fn on_event(&self, event: ClientEvent) {
        match event {
            ClientEvent::Connected => eprintln!("* CONNECTED"),
            ClientEvent::VersionRejected { suggested } => {
                eprintln!("* VERSION REJECTED, server suggests {suggested}");
            },
            ClientEvent::ProtocolError { reason } => eprintln!("* ERROR {reason}"),
            ClientEvent::MethodSucceeded { result, .. } => {
                let rendered = result.map_or_else(|| "null".to_string(), |value| value.to_string());
                eprintln!("* METHOD RESULT {rendered}");
            },
            ClientEvent::MethodFailed { reason, .. } => eprintln!("* ERROR {reason}"),
            ClientEvent::Change(change) => print_change(&change),
            ClientEvent::Ready { .. } => eprintln!("* READY"),
            ClientEvent::Updated { .. } => eprintln!("* UPDATED"),
            ClientEvent::SubscriptionDenied { reason, .. } => {
                eprintln!("* NO SUCH SUB{}", reason.map_or_else(String::new, |r| format!(" ({r})")));
            },
            ClientEvent::Closed => eprintln!("* CONNECTION CLOSED"),
        }
    }
}

fn print_change(change: &CollectionChange) {
    match change {
        CollectionChange::Added { collection, id, fields } => {
            for (key, value) in fields.iter().flatten() {
                eprintln!("* ADDED {collection} {id} {key} {value}");
            }
            if fields.is_none() {
                eprintln!("* ADDED {collection} {id}");
            }
        },
        CollectionChange::Changed { collection, id, fields, cleared } => {
            for (key, value) in fields.iter().flatten() {
                eprintln!("* CHANGED {collection} {id} {key} {value}");
            }
            for key in cleared.iter().flatten() {
                eprintln!("* CLEARED {collection} {id} {key}");
            }
        },
        CollectionChange::Removed { collection, ids } => {
            for id in ids {
                eprintln!("* REMOVED {collection} {id}");
            }
        },
    }
}

fn print_help() {
    eprintln!();
    eprintln!("call <method name> [<json array of parameters>]");
    eprintln!("  Calls a remote method");
    eprintln!(r#"  Example: call createApp [{{"name": "foo", "description": "bar"}}]"#);
    eprintln!();
    eprintln!("sub <subscription name> [<json array of parameters>]");
    eprintln!("  Subscribes to a remote dataset");
    eprintln!(r#"  Examples: `sub allApps` or `sub myApp ["foo"]`"#);
    eprintln!();
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let default_filter = if args.print_raw { "trace" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let stream = TcpStream::connect(&args.endpoint)?;
    let reader = BufReader::new(stream.try_clone()?);

    let transport = LineTransport { writer: Mutex::new(stream) };
    let client = Arc::new(Client::with_sink(transport, ClientConfig::default(), Arc::new(PrintSink)));

    // Transport delivery context: one inbound frame per line, in order.
    let delivery_client = Arc::clone(&client);
    thread::spawn(move || {
        for line in reader.lines() {
            match line {
                Ok(text) => delivery_client.handle_message(&text),
                Err(_) => break,
            }
        }
        delivery_client.handle_close();
    });

    client.connect()?;

    let interactive = io::stdin().is_terminal();
    let prompt = format!("{}> ", args.endpoint);

    let stdin = io::stdin();
    loop {
        if interactive {
            eprint!("{prompt}");
        }

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        match commands::parse(&line) {
            Command::Call { method, params } => report(client.call(&method, params)),
            Command::Sub { name, params } => report(client.subscribe(&name, params)),
            Command::Help => print_help(),
            Command::Quit => break,
            Command::Empty => {},
            Command::Unknown { input } => {
                eprintln!("unknown command: {input} (try `help`)");
            },
            Command::InvalidArgs { command, error } => {
                eprintln!("{command}: {error}");
            },
        }
    }

    Ok(())
}

fn report(result: Result<driftwire_client::Completion, driftwire_client::ClientError>) {
    match result {
        Ok(completion) => match completion.outcome {
            WaitOutcome::Completed | WaitOutcome::Rejected => {},
            WaitOutcome::Abandoned => eprintln!("* REQUEST ABANDONED (no result)"),
        },
        Err(error) => eprintln!("* ERROR {error}"),
    }
}
