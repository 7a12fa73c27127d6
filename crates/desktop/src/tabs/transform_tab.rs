use std::path::Path;
use std::time::Duration;

use iced::widget::{button, column, container, pick_list, row, text, Space};
use iced::{Element, Length};

use voicefair_core::accent::domain::accent_catalog::ACCENTS;
use voicefair_core::audio::domain::transform_error::TransformError;
use voicefair_core::session::comparison::Comparison;
use voicefair_core::session::transform_session::{SessionState, TransformSession};
use voicefair_core::shared::audio_asset::AudioAsset;
use voicefair_core::shared::constants::{AUDIO_EXTENSIONS, MAX_RECORDING_SECS};

use crate::app::Message;

pub fn view<'a>(
    session: &TransformSession,
    input_path: Option<&Path>,
    recording: Option<Duration>,
) -> Element<'a, Message> {
    if let Some(elapsed) = recording {
        return recording_state(elapsed);
    }
    let Some(original) = session.original() else {
        return empty_state();
    };

    let mut content = column![
        file_row(original, input_path),
        Space::new().height(16),
        accent_picker(session),
        Space::new().height(16),
        transform_button(session),
    ]
    .spacing(0);

    if let Some(error) = session.last_error() {
        content = content.push(Space::new().height(16)).push(error_panel(error));
    }

    if let Some(comparison) = session.comparison() {
        content = content
            .push(Space::new().height(20))
            .push(comparison_panel(&comparison));
    }

    content.into()
}

fn empty_state<'a>() -> Element<'a, Message> {
    let formats = AUDIO_EXTENSIONS
        .iter()
        .map(|e| e.to_uppercase())
        .collect::<Vec<_>>()
        .join(", ");

    container(
        column![
            text("Choose a recording to get started").size(17),
            Space::new().height(6),
            text("Up to 10 MB").size(13),
            Space::new().height(20),
            row![
                button(text("Browse Files").size(14))
                    .on_press(Message::SelectInput)
                    .padding([10, 24]),
                button(text("Record").size(14))
                    .on_press(Message::StartRecording)
                    .padding([10, 24])
                    .style(button::secondary),
            ]
            .spacing(8),
            Space::new().height(16),
            text(formats).size(12),
        ]
        .align_x(iced::Alignment::Center),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .center_x(Length::Fill)
    .center_y(Length::Fill)
    .into()
}

fn recording_state<'a>(elapsed: Duration) -> Element<'a, Message> {
    let secs = elapsed.as_secs().min(MAX_RECORDING_SECS as u64);

    container(
        column![
            text(format!("Recording\u{2026} {secs}s / {MAX_RECORDING_SECS}s")).size(17),
            Space::new().height(6),
            text("Recording stops by itself at the limit.").size(13),
            Space::new().height(20),
            button(text("Stop").size(14))
                .on_press(Message::StopRecording)
                .padding([10, 24]),
        ]
        .align_x(iced::Alignment::Center),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .center_x(Length::Fill)
    .center_y(Length::Fill)
    .into()
}

fn file_row<'a>(original: &AudioAsset, input_path: Option<&Path>) -> Element<'a, Message> {
    let location = input_path
        .and_then(Path::parent)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "microphone recording".to_string());

    row![
        column![
            text(original.name().to_string()).size(15),
            text(format!("{} \u{00B7} {location}", format_size(original.size_bytes()))).size(12),
        ]
        .width(Length::Fill),
        button(text("Play").size(13))
            .on_press(Message::PlayOriginal)
            .style(button::secondary),
        button(text("Change File").size(13))
            .on_press(Message::SelectInput)
            .style(button::secondary),
        button(text("Record").size(13))
            .on_press(Message::StartRecording)
            .style(button::secondary),
    ]
    .spacing(8)
    .align_y(iced::Alignment::Center)
    .into()
}

fn accent_picker<'a>(session: &TransformSession) -> Element<'a, Message> {
    let selected = session.accent().copied();
    let description = selected.map(|a| a.description).unwrap_or("");

    let picker = pick_list(ACCENTS, selected, Message::AccentSelected)
        .placeholder("Select an accent")
        .width(Length::Fill);

    column![
        text("Target accent").size(13),
        Space::new().height(6),
        picker,
        Space::new().height(4),
        text(description).size(12),
    ]
    .into()
}

fn transform_button<'a>(session: &TransformSession) -> Element<'a, Message> {
    let label = match session.state() {
        SessionState::Processing => "Transforming\u{2026}",
        SessionState::Failed => "Try Again",
        _ => "Transform Accent",
    };
    button(text(label).size(15))
        .on_press_maybe(session.can_transform().then_some(Message::RunTransform))
        .padding([12, 24])
        .width(Length::Fill)
        .into()
}

fn error_panel<'a>(error: &TransformError) -> Element<'a, Message> {
    let mut actions = row![].spacing(8);
    if error.needs_settings() {
        actions = actions.push(button(text("Open Settings").size(13)).on_press(Message::OpenSettings));
    }
    actions = actions.push(
        button(text("Dismiss").size(13))
            .on_press(Message::DismissError)
            .style(button::secondary),
    );

    container(
        column![
            text("Transformation failed").size(15),
            Space::new().height(4),
            text(error.to_string()).size(13),
            Space::new().height(10),
            actions,
        ]
        .spacing(0),
    )
    .padding(12)
    .width(Length::Fill)
    .style(container::rounded_box)
    .into()
}

fn comparison_panel<'a>(comparison: &Comparison) -> Element<'a, Message> {
    let side = |label: String, audio: &AudioAsset, play: Message| {
        column![
            text(label).size(14),
            text(format!("{} \u{00B7} {}", audio.name(), format_size(audio.size_bytes()))).size(12),
            Space::new().height(6),
            button(text("Play").size(13)).on_press(play),
        ]
        .width(Length::Fill)
    };

    column![
        row![
            side(
                comparison.left_label().to_string(),
                comparison.left(),
                Message::PlayOriginal
            ),
            side(
                comparison.right_label(),
                comparison.right(),
                Message::PlayTransformed
            ),
        ]
        .spacing(16),
        Space::new().height(16),
        row![
            button(text("Save Result").size(13))
                .on_press(Message::SaveTransformed)
                .style(button::secondary),
            button(text("Start Blind Test").size(13)).on_press(Message::StartBlindTest),
        ]
        .spacing(8),
    ]
    .into()
}

/// Human-readable size, e.g. `2.0 MB`.
pub fn format_size(bytes: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    if bytes as f64 >= MB {
        format!("{:.1} MB", bytes as f64 / MB)
    } else {
        format!("{:.0} KB", (bytes as f64 / 1024.0).ceil())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(2 * 1024 * 1024), "2.0 MB");
        assert_eq!(format_size(1536), "2 KB");
        assert_eq!(format_size(0), "0 KB");
    }
}
