use std::rc::Rc;

use nanorand::WyRand;
use tanks_core::{
    common::{bullet::BulletTuning, tank::TankTuning},
    network::{NetworkLink, NET_INIT},
    observer::callback,
    utils::Vector2,
    Headless, Tank,
};
use tanks_events::{TankTelemetry, TANK_FIRST_MOVE, TANK_FIRST_SHOT, TANK_MOVE, TANK_ROTATE};
use tokio::{
    io::{stdin, AsyncBufReadExt, BufReader},
    time::{self, Instant, MissedTickBehavior},
};
use tracing::info;

use crate::{
    config::HostConfig,
    console::ConsoleCommand,
    transport::StdoutTransport,
};

mod config;
mod console;
mod transport;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(config::log_level())
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = HostConfig::from_env();
    tracing::debug!(?config, "starting host");

    let network = Rc::new(NetworkLink::new(Rc::new(StdoutTransport)));
    if config.network {
        network.enable();
    }

    let rng = match config.seed {
        Some(seed) => WyRand::new_seed(seed),
        None => WyRand::new(),
    };
    let headless = Headless::build(config.viewport, rng, network.clone());
    log_telemetry(&headless);

    let _ = network.events().on(
        NET_INIT,
        callback(|id: &String| info!("network peer assigned id {}", id)),
    );

    let tuning = TankTuning::default();
    let spawn = config
        .viewport
        .half()
        .minus(&Vector2::new(tuning.width / 2.0, tuning.height / 2.0));
    let tank = match Tank::spawn(
        headless.runtime.clone(),
        TankTuning {
            position: spawn,
            ..tuning
        },
        BulletTuning::default(),
    ) {
        Ok(tank) => tank,
        Err(e) => {
            tracing::error!("could not spawn the tank: {}", e);
            return;
        }
    };
    info!("tank {} ready, type `enable` to take control", tank.id());

    let start = Instant::now();
    let mut ticker = time::interval(config.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut lines = BufReader::new(stdin()).lines();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                headless.scheduler.advance_to(start.elapsed());
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!("failed to read stdin: {}", e);
                        break;
                    }
                };

                let command = match console::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::warn!("{}", e);
                        continue;
                    }
                };

                if command == ConsoleCommand::Quit {
                    break;
                }
                run(&headless, &network, &tank, command);
            }
        }
    }

    tank.destroy();
    info!("host stopped");
}

fn run(headless: &Headless, network: &NetworkLink, tank: &Tank, command: ConsoleCommand) {
    let runtime = &headless.runtime;
    match command {
        ConsoleCommand::Down(code) => runtime.keyboard.press(code),
        ConsoleCommand::Up(code) => runtime.keyboard.release(code),
        ConsoleCommand::Session(command) => {
            let handled = runtime.session.command(command);
            tracing::debug!(handled, "session command published");
        }
        ConsoleCommand::Net(message) => network.receive(message),
        ConsoleCommand::Network(true) => network.enable(),
        ConsoleCommand::Network(false) => network.disable(),
        ConsoleCommand::Status => {
            if tank.is_destroyed() {
                info!("tank {} is destroyed", tank.id());
                return;
            }
            let state = tank.state();
            info!(
                "tank {} at ({:.1}, {:.1}) heading {:.0} deg, enabled: {}, bullets in flight: {}, network: {}",
                state.id(),
                state.position().x,
                state.position().y,
                state.heading(),
                state.is_enabled(),
                tank.controller().bullets().len(),
                network.is_enabled(),
            );
        }
        ConsoleCommand::Quit => {}
    }
}

fn log_telemetry(headless: &Headless) {
    let telemetry = headless.runtime.session.telemetry();
    for name in [TANK_MOVE, TANK_FIRST_MOVE, TANK_ROTATE, TANK_FIRST_SHOT] {
        let _ = telemetry.on(
            name,
            callback(move |event: &TankTelemetry| tracing::debug!(kind = name, ?event, "telemetry")),
        );
    }
}
