use iced::widget::{button, column, container, text, Column};
use iced::{color, Alignment, Color, Length};
use iced::{Element, Task, Theme};
use std::sync::Arc;
use tracing::{error, info, warn};

mod advice;
mod classify;
mod config;
mod error;
mod flow;
mod host;
mod logging;
mod state;
mod ui;

use classify::RoboflowClient;
use config::Settings;
use error::FlowError;
use flow::{ClassificationFlow, PickResult};
use host::DesktopHost;
use state::{Classification, RequestTicket};

const TITLE_COLOR: Color = color!(0x24, 0x5b, 0x35);

/// Main application state
struct LeafDoctor {
    /// Picker, classifier and the session they feed
    flow: ClassificationFlow,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked the "Choose Photo" button
    ChoosePhoto,
    /// The host answered the permission request and picker
    Picked(PickResult),
    /// A classification request settled
    Classified(RequestTicket, Result<Classification, FlowError>),
}

impl LeafDoctor {
    fn new(flow: ClassificationFlow) -> (Self, Task<Message>) {
        (LeafDoctor { flow }, Task::none())
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ChoosePhoto => Task::perform(self.flow.pick(), Message::Picked),
            Message::Picked(pick) => match self.flow.apply_pick(pick) {
                Some(pending) => Task::perform(pending.finish(), |(ticket, result)| {
                    Message::Classified(ticket, result)
                }),
                None => Task::none(),
            },
            Message::Classified(ticket, result) => {
                self.flow.settle(ticket, result);
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let session = self.flow.session();

        let mut content: Column<Message> = column![
            text("Plant Leaf\nDisease")
                .size(28)
                .color(TITLE_COLOR)
                .align_x(Alignment::Center),
            ui::photo_preview(session.selected()),
        ]
        .spacing(12)
        .max_width(380.0)
        .align_x(Alignment::Center);

        if let Some(outcome) = ui::outcome_view(session.outcome()) {
            content = content.push(outcome);
        }

        let label = if session.selected().is_some() {
            "Choose Another Photo"
        } else {
            "Choose Photo"
        };
        content = content.push(
            button(label)
                .on_press(Message::ChoosePhoto)
                .padding(12),
        );

        container(container(content).padding(16).style(container::rounded_box))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .padding(16)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Light
    }
}

/// Settings from file and environment, or environment alone if the file is bad
fn load_settings() -> Settings {
    Settings::load().unwrap_or_else(|err| {
        error!("⚠️  {}. Ignoring the config file.", err);
        Settings::from_env()
    })
}

fn main() -> iced::Result {
    logging::init_logging(logging::DEFAULT_LEVEL);

    let settings = load_settings();
    info!(
        "🌿 Leaf Doctor using {}/{} at {}",
        settings.model_id,
        settings.model_version,
        settings.base_url()
    );
    if !settings.has_credential() {
        warn!("ROBOFLOW_API_KEY is not set; classification is disabled");
    }

    let client = match RoboflowClient::new(settings) {
        Ok(client) => client,
        Err(err) => {
            error!("Failed to build HTTP client: {}", err);
            std::process::exit(1);
        }
    };
    let flow = ClassificationFlow::new(Arc::new(DesktopHost::new()), Arc::new(client));

    iced::application("Plant Leaf Disease", LeafDoctor::update, LeafDoctor::view)
        .theme(LeafDoctor::theme)
        .centered()
        .run_with(move || LeafDoctor::new(flow))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_settings_keeps_key_despite_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model_id = [").unwrap();

        std::env::set_var(config::CONFIG_PATH_VAR, &path);
        std::env::set_var("ROBOFLOW_API_KEY", "rf_valid_key");
        std::env::set_var("ROBOFLOW_TIMEOUT_SECS", "soon");
        let settings = load_settings();
        std::env::remove_var(config::CONFIG_PATH_VAR);
        std::env::remove_var("ROBOFLOW_API_KEY");
        std::env::remove_var("ROBOFLOW_TIMEOUT_SECS");

        assert!(settings.has_credential());
        assert_eq!(settings.request_timeout_secs, 60);
        assert_eq!(settings.model_id, Settings::default().model_id);
    }
}
