//! Run the interrupt bridge against the simulated radio.
//!
//! Exercises a transmit, a receive, an oversized receive, the timeout paths
//! and a burst of interrupts posted from another thread through the IRQ
//! queue, then prints the dispatch counters as JSON.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --bin sim-radio
//! ```

use log::{error, info, warn};
use sx12xx_irq::config::{LoRaBandwidth, LoRaCodingRate, LoRaSpreadingFactor, RadioSettings};
use sx12xx_irq::queue::{irq_queue, DEFAULT_QUEUE_DEPTH};
use sx12xx_irq::sim::{SimBoard, SimController, SimIrq, SimRadio};
use sx12xx_irq::{HardwareEvent, IrqBridge, RadioError, Response, Sx12xx};

type SimResult<T> = Result<T, RadioError<sx12xx_irq::sim::SimError>>;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("=== sx12xx-irq simulator ===");

    if let Err(e) = run_facade() {
        error!("radio scenario failed: {}", e);
        std::process::exit(1);
    }

    run_queue();
}

fn run_facade() -> SimResult<()> {
    let radio = SimRadio::new();
    let ctl = radio.controller();
    let mut sx = Sx12xx::new(radio, SimBoard::default(), RadioSettings::default())?;

    sx.set_frequency(868_100_000)?;
    sx.configure_lora_tx(
        14,
        LoRaBandwidth::Khz125,
        LoRaSpreadingFactor::Sf10,
        LoRaCodingRate::Cr4_5,
    )?;
    sx.configure_lora_rx(
        LoRaBandwidth::Khz125,
        LoRaSpreadingFactor::Sf10,
        LoRaCodingRate::Cr4_5,
    )?;

    // Transmit
    sx.send(b"hello")?;
    step(&mut sx, &ctl, SimIrq::TxDone, HardwareEvent::Dio0)?;

    // Receive, including a frame larger than the FIFO-sized buffer
    sx.set_rx()?;
    step(
        &mut sx,
        &ctl,
        SimIrq::RxDone {
            payload: b"world".to_vec(),
            rssi: -80,
            snr: 7,
        },
        HardwareEvent::Dio1,
    )?;
    info!("received {:?}", String::from_utf8_lossy(sx.buffer()));

    step(
        &mut sx,
        &ctl,
        SimIrq::RxDone {
            payload: vec![0x55; 300],
            rssi: -110,
            snr: -12,
        },
        HardwareEvent::Dio1,
    )?;
    info!(
        "oversized frame: {} bytes reported, {} kept",
        sx.rx_metadata().len,
        sx.buffer().len()
    );

    // Timeouts and errors
    step(&mut sx, &ctl, SimIrq::Timeout, HardwareEvent::Dio0)?;
    step(&mut sx, &ctl, SimIrq::CrcError, HardwareEvent::Dio0)?;
    for timer in [HardwareEvent::Timer1, HardwareEvent::Timer3] {
        let response = sx.handle_event(timer)?;
        info!("{} -> {:?}", timer, response);
    }

    // A line no handler was registered for
    match sx.handle_event(HardwareEvent::Dio3) {
        Ok(response) => warn!("DIO3 unexpectedly handled: {:?}", response),
        Err(e) => info!("DIO3 -> {}", e),
    }

    print_stats("facade", sx.stats());
    Ok(())
}

fn step(
    sx: &mut Sx12xx<SimRadio>,
    ctl: &SimController,
    irq: SimIrq,
    event: HardwareEvent,
) -> SimResult<Response> {
    ctl.raise(irq);
    let response = sx.handle_event(event)?;
    info!("{} -> {:?}", event, response);
    Ok(response)
}

/// Interrupts posted from a separate thread, drained by the polling loop.
fn run_queue() {
    let mut radio = SimRadio::new();
    let ctl = radio.controller();
    let mut bridge: IrqBridge<Vec<u8>> = IrqBridge::new();
    if let Err(e) = bridge.init(&mut radio, SimBoard::default()) {
        error!("bridge init failed: {}", e);
        std::process::exit(1);
    }
    bridge.set_rx_buffer(vec![0; 64]);

    let (sender, mut queue) = irq_queue(DEFAULT_QUEUE_DEPTH);
    let isr = std::thread::spawn(move || {
        for i in 0..8u8 {
            ctl.raise(SimIrq::RxDone {
                payload: vec![i; usize::from(i) + 1],
                rssi: -70 - i16::from(i),
                snr: 5,
            });
            if let Err(e) = sender.notify(HardwareEvent::Dio1) {
                warn!("{}", e);
            }
        }
    });
    if isr.join().is_err() {
        error!("interrupt thread panicked");
        return;
    }

    let drained = queue.drain(&mut bridge, |event, result| match result {
        Ok(state) => info!("{} -> {}", event, state),
        Err(e) => warn!("{}", e),
    });
    info!("drained {} events, {} dropped", drained, queue.dropped());
    print_stats("queue", bridge.stats());
}

fn print_stats(label: &str, stats: &sx12xx_irq::DispatchStats) {
    match serde_json::to_string_pretty(stats) {
        Ok(json) => println!("{} stats:\n{}", label, json),
        Err(e) => warn!("could not serialize stats: {}", e),
    }
}
