use std::sync::Arc;

use teloxide::{
    dispatching::dialogue::{self, InMemStorage},
    dptree::deps,
    prelude::*,
};

use crate::{
    config::Config,
    dialogue::State,
    handlers::{
        callbacks::handle_callback_query, generate_bot_commands, handle_message,
        membership::handle_my_chat_member,
    },
    store::Store,
};

pub async fn entry() {
    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            log::error!("Can't start: {e}");
            return;
        }
    };

    let bot = Bot::new(&config.token);

    if let Err(e) = bot.set_my_commands(generate_bot_commands()).await {
        log::warn!("Failed to set bot commands: {e}");
    }

    let store = Arc::new(Store::open(&config.data_file).await);
    log::info!("Using data file {}", config.data_file.display());

    log::info!("Creating the handler...");

    let handler = dptree::entry()
        .branch(Update::filter_my_chat_member().endpoint(handle_my_chat_member))
        .branch(
            // Conversations only happen in DMs, don't keep dialogues for groups.
            dptree::filter(|update: Update| update.chat().is_some_and(|chat| chat.is_private()))
                .chain(dialogue::enter::<Update, InMemStorage<State>, State, _>())
                .branch(Update::filter_message().endpoint(handle_message))
                .branch(Update::filter_callback_query().endpoint(handle_callback_query)),
        );

    log::info!("Dispatching the dispatcher!");

    Dispatcher::builder(bot, handler)
        .default_handler(|_| async {})
        .dependencies(deps![store, config, InMemStorage::<State>::new()])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Stopped.");
}
