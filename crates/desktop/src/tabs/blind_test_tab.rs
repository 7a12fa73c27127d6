use iced::widget::{button, column, container, radio, row, text, Space};
use iced::{Element, Length};

use voicefair_core::session::blind_test::{BlindTest, Slot};

use crate::app::Message;

pub fn view<'a>(test: Option<&BlindTest>, choice: Option<Slot>) -> Element<'a, Message> {
    let Some(test) = test else {
        return container(
            text("Transform a recording first, then start a blind test from its result.")
                .size(14),
        )
        .width(Length::Fill)
        .center_x(Length::Fill)
        .padding(24)
        .into();
    };

    let prompt = format!(
        "One clip is your original and one has the {} accent. Which is transformed?",
        test.accent().display_name
    );

    let clips = row(Slot::ALL
        .iter()
        .map(|&slot| {
            column![
                text(slot.label()).size(15),
                Space::new().height(6),
                button(text("Play").size(13)).on_press(Message::PlayBlind(slot)),
                Space::new().height(8),
                radio("Transformed", slot, choice, Message::BlindChoice),
            ]
            .width(Length::Fill)
            .into()
        })
        .collect::<Vec<_>>())
    .spacing(16);

    let mut content = column![text(prompt).size(14), Space::new().height(16), clips]
        .spacing(0);

    match test.reveal_message() {
        Some(message) => {
            content = content
                .push(Space::new().height(16))
                .push(container(text(message).size(14)).padding(12).style(container::rounded_box))
                .push(Space::new().height(12))
                .push(button(text("Try Again").size(13)).on_press(Message::ResetBlindTest));
        }
        None => {
            content = content.push(Space::new().height(16)).push(
                button(text("Submit Answer").size(14))
                    .on_press_maybe(choice.map(|_| Message::SubmitBlindChoice))
                    .padding([10, 24]),
            );
        }
    }

    content.into()
}
