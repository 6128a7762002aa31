mod array;
mod emitter;
mod error;
mod focus;
mod parameters;
mod style;

use rand::prelude::*;
use std::io::ErrorKind;
use std::time::{Duration, Instant};
use tracing::{error, info, trace, warn};
use tracing_subscriber::EnvFilter;

use iced::button::{self, Button};
use iced::canvas::{Cache, Canvas, Cursor, Frame, Geometry, Path, Stroke};
use iced::slider::{self, Slider};
use iced::time;
use iced::{
    Align, Application, Clipboard, Color, Column, Command, Container, Element, HorizontalAlignment,
    Length, Point, Rectangle, Row, Settings, Size, Subscription, VerticalAlignment,
};

use crate::array::EmitterArray;
use crate::emitter::{Emitter, Position};
use crate::focus::FocalPoint;
use crate::parameters::Parameters;

const PARAMETERS_PATH: &str = "beamformer.json";
const GRID_STEP: f32 = 10.0;
const EMITTER_RADIUS: f32 = 0.4;
const FOCUS_RADIUS: f32 = 4.0;
const RING_WIDTH: f32 = 2.0;

#[derive(Clone, Debug)]
enum Message {
    Tick,
    TogglePlay,
    Randomize,
    Reset,
    TickAmountChanged(i32),
    ParametersChanged(Parameters),
}

#[derive(Default)]
struct Controls {
    play_button: button::State,
    next_button: button::State,
    randomize_button: button::State,
    reset_button: button::State,
    tick_amount_slider: slider::State,
}

struct Beamformer {
    state: State,
    controls: Controls,
}

impl Application for Beamformer {
    type Executor = iced::executor::Default;
    type Message = Message;
    type Flags = FocalPoint;

    fn new(focus: Self::Flags) -> (Self, Command<Message>) {
        (
            Self {
                state: State::new(Parameters::default(), focus),
                controls: Controls::default(),
            },
            Command::perform(tokio::fs::read_to_string(PARAMETERS_PATH), load_parameters),
        )
    }

    fn title(&self) -> String {
        String::from("Phased Array Beamformer")
    }

    fn subscription(&self) -> Subscription<Message> {
        if self.state.is_playing {
            let period = Duration::from_secs_f32(self.state.parameters.frame_time());
            time::every(period).map(|_| Message::Tick)
        } else {
            Subscription::none()
        }
    }

    fn update(&mut self, message: Self::Message, _clipboard: &mut Clipboard) -> Command<Message> {
        match message {
            Message::TogglePlay => {
                self.state.is_playing = !self.state.is_playing;
            }
            Message::Tick => {
                self.state.tick();
            }
            Message::Randomize => {
                let half_width = (self.state.parameters.view_width / 2.0) as i32;
                let half_height = (self.state.parameters.view_height / 2.0) as i32;
                let mut rng = thread_rng();
                self.state.focus = FocalPoint {
                    x: rng.gen_range(-half_width..=half_width),
                    y: rng.gen_range(-half_height..=half_height),
                };
                info!(x = self.state.focus.x, y = self.state.focus.y, "focal point randomized");
                self.state.rebuild();
            }
            Message::Reset => {
                self.state.rebuild();
            }
            Message::TickAmountChanged(tick_amount) => {
                self.state.tick_amount = tick_amount;
            }
            Message::ParametersChanged(parameters) => {
                self.state.parameters = parameters;
                self.state.rebuild();
            }
        }
        Command::none()
    }

    fn view(&mut self) -> Element<Message> {
        let playback_controls = Row::new()
            .spacing(10)
            .push(
                Button::new(
                    &mut self.controls.play_button,
                    iced::widget::Text::new(if self.state.is_playing {
                        "Stop"
                    } else {
                        "Play"
                    }),
                )
                .on_press(Message::TogglePlay)
                .style(style::Button),
            )
            .push(
                Button::new(
                    &mut self.controls.next_button,
                    iced::widget::Text::new("Next"),
                )
                .on_press(Message::Tick)
                .style(style::Button),
            )
            .push(
                Button::new(
                    &mut self.controls.randomize_button,
                    iced::widget::Text::new("Randomize"),
                )
                .on_press(Message::Randomize)
                .style(style::Button),
            )
            .push(
                Button::new(
                    &mut self.controls.reset_button,
                    iced::widget::Text::new("Reset"),
                )
                .on_press(Message::Reset)
                .style(style::Button),
            );

        let tick_amount_controls = Row::new()
            .spacing(10)
            .push(
                Slider::new(
                    &mut self.controls.tick_amount_slider,
                    1..=10,
                    self.state.tick_amount,
                    Message::TickAmountChanged,
                )
                .step(1)
                .width(Length::Units(200))
                .style(style::Slider),
            )
            .push(iced::widget::Text::new(format!("Speed = {}", self.state.tick_amount)).size(16))
            .align_items(Align::Center);

        let controls = Row::new()
            .spacing(20)
            .push(playback_controls)
            .push(tick_amount_controls);

        let content = Column::new()
            .spacing(10)
            .padding(10)
            .align_items(Align::Center)
            .push(
                Canvas::new(&mut self.state)
                    .width(Length::Fill)
                    .height(Length::Fill),
            )
            .push(controls);

        Container::new(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(style::Container)
            .into()
    }
}

fn load_parameters(result: std::io::Result<String>) -> Message {
    let parameters = match result {
        Ok(contents) => match serde_json::from_str::<Parameters>(&contents) {
            Ok(parameters) => parameters,
            Err(err) => {
                error!(%err, path = PARAMETERS_PATH, "malformed parameters, using defaults");
                Parameters::default()
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(path = PARAMETERS_PATH, "no parameters file, using defaults");
            Parameters::default()
        }
        Err(err) => {
            warn!(%err, path = PARAMETERS_PATH, "failed to read parameters, using defaults");
            Parameters::default()
        }
    };

    match parameters.validate() {
        Ok(()) => Message::ParametersChanged(parameters),
        Err(err) => {
            error!(%err, path = PARAMETERS_PATH, "rejected parameters, using defaults");
            Message::ParametersChanged(Parameters::default())
        }
    }
}

struct State {
    array: EmitterArray,
    parameters: Parameters,
    focus: FocalPoint,
    is_playing: bool,
    tick_amount: i32,
    timestep: i32,
    last_tick_duration: Duration,
    background: Cache,
    rings: Cache,
    markers: Cache,
}

impl State {
    fn new(parameters: Parameters, focus: FocalPoint) -> Self {
        let mut state = Self {
            array: EmitterArray::default(),
            parameters,
            focus,
            is_playing: true,
            tick_amount: 1,
            timestep: 0,
            last_tick_duration: Duration::default(),
            background: Cache::default(),
            rings: Cache::default(),
            markers: Cache::default(),
        };
        state.rebuild();
        state
    }

    /// Lays the emitters out again for the current parameters and focus.
    fn rebuild(&mut self) {
        self.array = match EmitterArray::focused_line(&self.parameters, &self.focus.position()) {
            Ok(array) => array,
            Err(err) => {
                error!(%err, "failed to build emitter array");
                EmitterArray::default()
            }
        };
        self.timestep = 0;
        self.background.clear();
        self.rings.clear();
        self.markers.clear();
    }

    fn tick(&mut self) {
        let start = Instant::now();

        let dt = self.parameters.frame_time() * self.tick_amount as f32;
        self.array.increment(dt);

        self.timestep += self.tick_amount;
        self.last_tick_duration = start.elapsed();
        self.rings.clear();
        trace!(timestep = self.timestep, duration = ?self.last_tick_duration, "ticked");
    }

    /// Pixels per world unit, keeping the aspect ratio square.
    fn scale(&self, size: Size) -> f32 {
        (size.width / self.parameters.view_width).min(size.height / self.parameters.view_height)
    }

    fn project(&self, position: Position, size: Size) -> Point {
        let scale = self.scale(size);
        Point::new(
            size.width / 2.0 + position.x * scale,
            size.height / 2.0 - position.y * scale,
        )
    }
}

impl<'a> iced::canvas::Program<Message> for State {
    fn draw(&self, bounds: Rectangle, _cursor: Cursor) -> Vec<Geometry> {
        let size = bounds.size();
        let scale = self.scale(size);

        let background = self.background.draw(size, |frame| {
            let background = Path::rectangle(Point::ORIGIN, frame.size());
            frame.fill(&background, style::BACKGROUND);

            let half_width = self.parameters.view_width / 2.0;
            let half_height = self.parameters.view_height / 2.0;
            let grid = Stroke {
                color: style::GRID,
                width: 1.0,
                ..Stroke::default()
            };

            let mut x = (-half_width / GRID_STEP).ceil() * GRID_STEP;
            while x <= half_width {
                let line = Path::line(
                    self.project(Position::new(x, -half_height), size),
                    self.project(Position::new(x, half_height), size),
                );
                frame.stroke(&line, grid);
                x += GRID_STEP;
            }

            let mut y = (-half_height / GRID_STEP).ceil() * GRID_STEP;
            while y <= half_height {
                let line = Path::line(
                    self.project(Position::new(-half_width, y), size),
                    self.project(Position::new(half_width, y), size),
                );
                frame.stroke(&line, grid);
                y += GRID_STEP;
            }
        });

        let start = Instant::now();

        let rings = self.rings.draw(size, |frame| {
            for circle in self.array.circles() {
                if circle.opacity <= 0.0 || circle.radius <= 0.0 {
                    continue;
                }
                let path = Path::circle(self.project(circle.center, size), circle.radius * scale);
                frame.stroke(
                    &path,
                    Stroke {
                        color: Color {
                            a: circle.opacity,
                            ..style::RING
                        },
                        width: RING_WIDTH,
                        ..Stroke::default()
                    },
                );
            }
        });

        let duration = start.elapsed();

        let markers = self.markers.draw(size, |frame| {
            for emitter in self.array.emitters() {
                let dot = Path::circle(
                    self.project(emitter.position(), size),
                    EMITTER_RADIUS * scale,
                );
                frame.fill(&dot, style::EMITTER);
            }

            let focus = Path::circle(self.project(self.focus.position(), size), FOCUS_RADIUS);
            frame.fill(&focus, style::FOCUS);
        });

        let overlay = {
            let mut frame = Frame::new(size);

            let text = iced::canvas::Text {
                color: Color::WHITE,
                size: 14.0,
                position: Point::new(frame.width(), frame.height()),
                horizontal_alignment: HorizontalAlignment::Right,
                vertical_alignment: VerticalAlignment::Bottom,
                ..Default::default()
            };

            let clock = self
                .array
                .emitters()
                .first()
                .map(Emitter::elapsed)
                .unwrap_or_default();

            frame.fill_text(iced::canvas::Text {
                content: format! {
                    "focus = ({})\nt = {:.2}\ntimestep = {}\nlast_tick_duration = {:?}\nDraw duration: {:?}\nEmitter count: {}",
                    self.focus,
                    clock,
                    self.timestep,
                    self.last_tick_duration,
                    duration,
                    self.array.emitters().len(),
                },
                ..text
            });

            frame.into_geometry()
        };

        vec![background, rings, markers, overlay]
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let stdin = std::io::stdin();
    let focus = focus::prompt(stdin.lock(), std::io::stdout())?;
    println!("Directing the emitter to point to {}", focus);
    info!(x = focus.x, y = focus.y, "focal point accepted");

    Beamformer::run(Settings {
        antialiasing: true,
        ..Settings::with_flags(focus)
    })
    .map_err(|err| anyhow::anyhow!("failed to run beamformer window: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn loaded(result: std::io::Result<String>) -> Parameters {
        match load_parameters(result) {
            Message::ParametersChanged(parameters) => parameters,
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let err = std::io::Error::new(ErrorKind::NotFound, "missing");
        assert_eq!(loaded(Err(err)), Parameters::default());

        let err = std::io::Error::new(ErrorKind::PermissionDenied, "denied");
        assert_eq!(loaded(Err(err)), Parameters::default());
    }

    #[test]
    fn test_malformed_json_uses_defaults() {
        assert_eq!(loaded(Ok("{ not json".into())), Parameters::default());
    }

    #[test]
    fn test_invalid_parameters_use_defaults() {
        assert_eq!(loaded(Ok(r#"{ "frequency": 0 }"#.into())), Parameters::default());
        assert_eq!(loaded(Ok(r#"{ "fps": 2000 }"#.into())), Parameters::default());
        assert_eq!(loaded(Ok(r#"{ "max_radius": 1e30 }"#.into())), Parameters::default());
    }

    #[test]
    fn test_partial_file_overrides_defaults() {
        let parameters = loaded(Ok(r#"{ "emitter_count": 4, "fps": 60 }"#.into()));
        assert_eq!(parameters.emitter_count, 4);
        assert_eq!(parameters.fps, 60);
        assert_relative_eq!(parameters.frequency, 0.2);
    }

    #[test]
    fn test_tick_advances_by_frame_time() {
        let mut state = State::new(Parameters::default(), FocalPoint { x: 0, y: 40 });
        let before = state.array.emitters()[0].elapsed();
        state.tick_amount = 3;
        state.tick();
        assert_eq!(state.timestep, 3);
        assert_relative_eq!(
            state.array.emitters()[0].elapsed() - before,
            3.0 / 30.0,
            epsilon = 1e-5
        );
    }
}
