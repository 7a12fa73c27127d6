mod app;
mod tabs;
mod workers;

use app::App;

fn main() -> iced::Result {
    env_logger::init();

    iced::application(App::new, App::update, App::view)
        .title("VoiceFair")
        .subscription(App::subscription)
        .window(iced::window::Settings {
            size: iced::Size::new(620.0, 540.0),
            ..Default::default()
        })
        .run()
}
