//! Message texts and the main menu.
//!
//! Every text is Telegram HTML. Anything that comes from the scraped page is
//! escaped before it is interpolated.

use super::{Button, Keyboard};
use crate::categories::CategoryRegistry;
use crate::models::NewsItem;
use crate::router::Action;
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Main menu: one row per category, then subscribe/refresh, then help.
pub fn main_menu(registry: &CategoryRegistry) -> Keyboard {
    let mut rows: Vec<Vec<Button>> = registry
        .iter()
        .map(|c| vec![Button::new(c.label.clone(), Action::Category(c.key.clone()).payload())])
        .collect();
    rows.push(vec![
        Button::new("🔔 Subscribe", Action::Subscribe.payload()),
        Button::new("🔄 Refresh", Action::Refresh.payload()),
    ]);
    rows.push(vec![Button::new("❓ Help", Action::Help.payload())]);
    Keyboard { rows }
}

pub fn welcome(registry: &CategoryRegistry) -> String {
    let labels = registry
        .iter()
        .map(|c| encode_text(&c.label).into_owned())
        .collect::<Vec<_>>()
        .join(" • ");
    format!("🗞️ <b>Welcome to the BBC News bot!</b>\n\nPick a category you are interested in:\n{labels}")
}

pub fn loading(label: &str) -> String {
    format!("⏳ Loading the latest news in <b>{}</b>...", encode_text(label))
}

pub fn header(label: &str) -> String {
    format!("🗞️ <b>News: {}</b>", encode_text(label))
}

pub fn news_item(item: &NewsItem) -> String {
    format!(
        "<b>{}</b>\n🕒 {}\n🔗 <a href=\"{}\">Read on BBC</a>",
        encode_text(&item.title),
        encode_text(&item.published_label),
        encode_double_quoted_attribute(&item.link),
    )
}

pub fn next_action() -> String {
    "📌 Choose your next action:".to_string()
}

pub fn news_not_found() -> String {
    "⚠️ News not found.".to_string()
}

pub fn no_news() -> String {
    "⚠️ No news found.".to_string()
}

pub fn category_not_found() -> String {
    "⚠️ Category not found.".to_string()
}

pub fn subscribed() -> String {
    "🔔 You are subscribed to updates!\nYou will get the freshest news.".to_string()
}

pub fn refreshing() -> String {
    "🔄 Refreshing the news list...".to_string()
}

pub fn choose_category() -> String {
    "📌 Choose a category or action:".to_string()
}

pub fn help() -> String {
    "ℹ️ <b>How to use the bot:</b>\n\n\
     • Tap a category to get the news\n\
     • Use «Subscribe» to get updates\n\
     • Tap «Refresh» to return to the list"
        .to_string()
}
