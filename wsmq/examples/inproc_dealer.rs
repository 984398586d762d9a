//! Round-robin request/reply over the inproc transport
//!
//! Two in-process workers echo requests back. The DEALER socket spreads
//! requests across them, and one worker is restarted halfway through to
//! show the socket reconnecting on its own.
//!
//! # Run
//!
//! ```sh
//! RUST_LOG=debug cargo run --example inproc_dealer
//! ```

use wsmq::prelude::*;
use wsmq::InprocListener;

fn echo_pending(listener: &InprocListener, workers: &mut Vec<InprocPeer>) -> std::io::Result<()> {
    while let Some(peer) = listener.accept() {
        workers.push(peer);
    }
    for worker in workers.iter_mut() {
        while let Some(request) = worker.recv_message() {
            worker.send_message(&request)?;
        }
    }
    Ok(())
}

#[compio::main]
async fn main() -> Result<()> {
    wsmq::dev_tracing::init_tracing();
    println!("=== Inproc DEALER Demo ===\n");

    let network = InprocNetwork::new();
    let listeners = [
        network.bind("inproc://worker-a")?,
        network.bind("inproc://worker-b")?,
    ];

    let (transport, events) = network.transport();
    let options = SocketOptions::default().with_debug_logging(true);
    let mut driver = Driver::round_robin(transport, events, options);
    let monitor = driver.socket_mut().monitor();

    for listener in &listeners {
        driver.connect(format!("inproc://{}", listener.name()));
    }
    driver.wait_ready().await?;
    driver.pump();
    println!("Connected to {} workers\n", driver.socket().active_endpoints().len());

    let mut workers: Vec<Vec<InprocPeer>> = vec![Vec::new(), Vec::new()];
    for round in 0..6 {
        if round == 3 {
            println!("-- restarting worker-a --");
            for worker in workers[0].drain(..) {
                worker.close(1012, "restart");
            }
            driver.pump();
        }

        let mut request = Message::new();
        request.push_str("request").push_uint(round, 4)?;
        if !driver.send(&request)? {
            println!("request {round} not sent: no workers");
            continue;
        }

        for (listener, peers) in listeners.iter().zip(workers.iter_mut()) {
            echo_pending(listener, peers)?;
        }

        let mut reply = driver.recv().await?;
        let tag = reply.pop_str()?;
        let n = reply.pop_uint(4)?;
        println!("reply: {tag} #{n}");
    }

    println!("\nLifecycle events:");
    for event in monitor.try_iter() {
        println!("  {event}");
    }
    Ok(())
}
