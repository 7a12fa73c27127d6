use iced::widget::{button, column, row, text, text_input, Space};
use iced::{Element, Length};

use crate::app::{KeyStatus, Message};

pub fn view<'a>(api_key_input: &str, status: &KeyStatus) -> Element<'a, Message> {
    let checking = *status == KeyStatus::Checking;
    let can_save = !checking && !api_key_input.trim().is_empty();
    let can_clear = !checking && matches!(status, KeyStatus::Stored | KeyStatus::Valid);

    column![
        text("ElevenLabs API key").size(16),
        Space::new().height(4),
        text("The key is stored on this computer and sent only to ElevenLabs.").size(12),
        Space::new().height(12),
        text_input("Paste your API key", api_key_input)
            .secure(true)
            .on_input(Message::ApiKeyChanged)
            .on_submit(Message::SaveApiKey)
            .width(Length::Fill),
        Space::new().height(8),
        row![
            button(text("Verify & Save").size(13))
                .on_press_maybe(can_save.then_some(Message::SaveApiKey)),
            button(text("Remove Key").size(13))
                .on_press_maybe(can_clear.then_some(Message::ClearApiKey))
                .style(button::secondary),
        ]
        .spacing(8),
        Space::new().height(8),
        text(status.describe()).size(13),
        Space::new().height(16),
        button(text("Get a key at elevenlabs.io").size(12))
            .on_press(Message::OpenProviderSite)
            .style(button::text),
    ]
    .spacing(0)
    .into()
}
