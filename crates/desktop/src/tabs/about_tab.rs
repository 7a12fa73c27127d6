use iced::widget::{button, column, text, Space};
use iced::Element;

use crate::app::Message;

pub fn view() -> Element<'static, Message> {
    let version = env!("CARGO_PKG_VERSION");

    column![
        text("VoiceFair").size(22),
        Space::new().height(4),
        text(format!("Version {version}")).size(13),
        Space::new().height(12),
        text(
            "Hear your own recording in a different accent, then check in a blind \
             test whether you can tell the two apart."
        )
        .size(13),
        Space::new().height(12),
        text(
            "Audio is sent to ElevenLabs for speech-to-speech conversion. \
             Nothing else leaves this computer."
        )
        .size(13),
        Space::new().height(16),
        button(text("Visit elevenlabs.io").size(13))
            .on_press(Message::OpenProviderSite)
            .padding([8, 16]),
    ]
    .spacing(0)
    .into()
}
