use dotenv::dotenv;
use std::sync::Arc;
use teloxide::{dispatching::UpdateHandler, prelude::*};
use tracing::{error, info};
use x_relay_rs::{
    commands::{self, Command},
    compress::{Compressor, Ffmpeg},
    config::Config,
    download::{Fetcher, YtDlp},
    handler::{GENERIC_FAILURE, RequestHandler},
    reply::{ChatReply, Reply},
    telemetry::setup_logger,
};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenv().ok();
    color_eyre::install()?;

    let config = Config::from_env()?;
    setup_logger(&config.log_level)?;
    config.ensure_download_dir().await?;
    info!(?config, "configuration loaded");

    let compressor = Compressor::new(Arc::new(Ffmpeg::new(&config)), config.size_ceiling);
    let fetcher = Fetcher::new(
        Arc::new(YtDlp::new(&config)),
        compressor,
        config.download_dir.clone(),
        config.size_ceiling,
    );
    let handler = Arc::new(RequestHandler::new(fetcher));

    // a slow upload keeps making progress, so only silence should time out
    let client = teloxide::net::default_reqwest_settings()
        .read_timeout(config.read_timeout)
        .timeout(config.request_timeout)
        .build()?;
    let bot = Bot::with_client(config.token.clone(), client);

    info!("bot starting");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![handler])
        .error_handler(LoggingErrorHandler::with_custom_text(
            "an error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn schema() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(commands::answer),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.text().is_some_and(|t| !t.starts_with('/')))
                .endpoint(relay),
        )
}

/// Run the request on its own task so slow downloads never hold up the
/// dispatcher.
async fn relay(bot: Bot, msg: Message, handler: Arc<RequestHandler>) -> ResponseResult<()> {
    let Some(text) = msg.text().map(ToOwned::to_owned) else {
        return Ok(());
    };
    let reply = ChatReply::to_message(bot, &msg);

    tokio::spawn(async move {
        match handler.handle(&reply, &text).await {
            Ok(outcome) => info!(chat = %reply.chat_id(), ?outcome, "request finished"),
            Err(err) => {
                error!(%err, chat = %reply.chat_id(), "request failed");
                let _ = reply.text(GENERIC_FAILURE).await;
            }
        }
    });

    Ok(())
}
