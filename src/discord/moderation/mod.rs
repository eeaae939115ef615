// Discord moderation adapter - event handling and the serenity action sink.

pub mod action_sink;
pub mod message_handler;
