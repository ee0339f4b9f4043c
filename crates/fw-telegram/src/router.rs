use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use fw_core::{
    config::Config,
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    monitor::FlightMonitor,
    notifier::ChannelNotifier,
    ports::SnapshotSource,
    scheduler::PollScheduler,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub monitor: Arc<FlightMonitor>,
    pub messenger: Arc<dyn MessagingPort>,
}

/// Start the poll scheduler and serve chat commands until the dispatcher stops.
pub async fn run_polling(cfg: Arc<Config>, source: Arc<dyn SnapshotSource>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!("flightwatch started: @{}", me.username()),
        Err(e) => warn!(error = %e, "could not fetch bot identity"),
    }
    info!(
        channel = cfg.channel_id.0,
        watch = ?cfg.watch.iter().collect::<Vec<_>>(),
        "configuration loaded"
    );

    // Event bursts go through the throttle; the adapter still honours 429 RetryAfter.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig::default(),
    ));

    let notifier = Arc::new(ChannelNotifier::new(messenger.clone(), cfg.channel_id));
    let monitor = Arc::new(FlightMonitor::from_config(&cfg, source, notifier));

    let scheduler = PollScheduler::new(monitor.clone(), cfg.poll_interval);
    let cancel = scheduler.cancel_token();
    let poller = scheduler.spawn();

    let state = Arc::new(AppState {
        cfg,
        monitor,
        messenger,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    cancel.cancel();
    if let Err(e) = poller.await {
        warn!(error = %e, "poll scheduler task ended abnormally");
    }

    Ok(())
}
