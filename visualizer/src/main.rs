use dopplercore::interface::{EngineSnapshot, ObjectSnapshot, Scenario};
use dopplercore::math::Vec2;
use dopplercore::simulation::interaction::{self, PointerState};
use dopplercore::{Engine, EngineConfig, ObjectId, ObjectKind};
use iced::{
    mouse,
    time::{self, Instant},
    widget::{
        button,
        canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
        column, row, scrollable, slider, text, Column, Container,
    },
    Alignment, Color, Element, Length, Pixels, Point, Rectangle, Renderer, Subscription, Task,
    Theme,
};
use serde::Deserialize;
use std::time::Duration;

const CANVAS_WIDTH: f32 = 880.0;
const CANVAS_HEIGHT: f32 = 640.0;
const GRID_SPACING: f32 = 40.0;
/// Speed that maps to the hottest object color.
const SPEED_COLOR_CEILING: f64 = 300.0;
const BRIDGE_URL: &str = "http://127.0.0.1:9000/scenario";

fn main() -> iced::Result {
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .window_size((1300.0, 720.0))
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "Doppler Workbench".into()
}

fn application_subscription(state: &Visualizer) -> Subscription<Message> {
    if state.paused {
        Subscription::none()
    } else {
        time::every(Duration::from_millis(16)).map(Message::Tick)
    }
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

struct Visualizer {
    engine: Engine,
    epoch: Instant,
    pointer: PointerState,
    paused: bool,
    /// Last heading chosen on the slider; kept while the speed is zero.
    heading_deg: f64,
    status: String,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    Tick(Instant),
    AddObject(ObjectKind),
    Select(ObjectId),
    DeleteSelected,
    FrequencyChanged(f32),
    SpeedChanged(f32),
    HeadingChanged(f32),
    AccelerationChanged(Axis, f32),
    TogglePause,
    Clear,
    Pointer(PointerEvent),
    Export,
    Exported(Result<String, String>),
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy)]
enum PointerEvent {
    Pressed(Point),
    Moved(Point),
    Released,
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        let config = EngineConfig {
            viewport_width: CANVAS_WIDTH as f64,
            viewport_height: CANVAS_HEIGHT as f64,
            ..Default::default()
        };
        let mut engine = Engine::new(config).unwrap_or_default();
        let source = engine.create_object(ObjectKind::Source).id();
        let status = match engine.set_velocity(source, Vec2::new(60.0, 0.0)) {
            Ok(()) => "Drag objects on the canvas; select one to edit it.".to_string(),
            Err(err) => err.to_string(),
        };

        (
            Visualizer {
                engine,
                epoch: Instant::now(),
                pointer: PointerState::default(),
                paused: false,
                heading_deg: 0.0,
                status,
                history: Vec::new(),
            },
            Task::none(),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick(now) => {
                let timestamp = now.duration_since(state.epoch).as_secs_f64();
                if let Err(err) = state.engine.tick(timestamp) {
                    state.status = format!("Frame error: {err}");
                }
                state.engine.prune_wavefronts();
                Task::none()
            }
            Message::AddObject(kind) => {
                let id = state.engine.create_object(kind).id();
                state.pointer.selected = Some(id);
                state.push_history(format!("Added {kind} {id}"));
                Task::none()
            }
            Message::Select(id) => {
                state.pointer.selected = Some(id);
                if let Some(object) = state.engine.object(id) {
                    if object.speed() > 0.0 {
                        state.heading_deg = object.velocity().direction_deg();
                    }
                }
                Task::none()
            }
            Message::DeleteSelected => {
                if let Some(id) = state.pointer.selected.take() {
                    match state.engine.delete_object(id) {
                        Ok(removed) => state.push_history(format!("Deleted {} {id}", removed.kind())),
                        Err(err) => state.status = err.to_string(),
                    }
                }
                state.pointer = interaction::sanitize(&state.engine, state.pointer);
                Task::none()
            }
            Message::FrequencyChanged(value) => {
                if let Some(id) = state.pointer.selected {
                    if let Err(err) = state.engine.set_frequency(id, value as f64) {
                        state.status = err.to_string();
                    }
                }
                Task::none()
            }
            Message::SpeedChanged(speed) => {
                let heading = state.heading_deg;
                state.edit_selected(|engine, id| engine.set_velocity_polar(id, speed as f64, heading));
                Task::none()
            }
            Message::HeadingChanged(heading) => {
                state.heading_deg = heading as f64;
                let speed = state.selected_object().map(|o| o.speed).unwrap_or(0.0);
                state.edit_selected(|engine, id| engine.set_velocity_polar(id, speed, heading as f64));
                Task::none()
            }
            Message::AccelerationChanged(axis, value) => {
                if let Some(current) = state.selected_object().map(|o| o.acceleration) {
                    let next = match axis {
                        Axis::X => Vec2::new(value as f64, current.y),
                        Axis::Y => Vec2::new(current.x, value as f64),
                    };
                    state.edit_selected(|engine, id| engine.set_acceleration(id, next));
                }
                Task::none()
            }
            Message::TogglePause => {
                state.paused = !state.paused;
                if !state.paused {
                    state.engine.resync_clock();
                }
                Task::none()
            }
            Message::Clear => {
                state.engine.clear();
                state.pointer = PointerState::default();
                state.push_history("Cleared the scene".into());
                Task::none()
            }
            Message::Pointer(event) => {
                state.pointer = match event {
                    PointerEvent::Pressed(point) => {
                        interaction::pointer_pressed(&state.engine, state.pointer, to_vec(point))
                    }
                    PointerEvent::Moved(point) => {
                        interaction::pointer_moved(&mut state.engine, state.pointer, to_vec(point))
                    }
                    PointerEvent::Released => interaction::pointer_released(state.pointer),
                };
                Task::none()
            }
            Message::Export => {
                let scenario = state.engine.to_scenario(10.0, 1.0 / 60.0);
                state.status = "Sending scenario to the simulator bridge...".into();
                Task::perform(post_scenario(scenario), Message::Exported)
            }
            Message::Exported(Ok(message)) => {
                state.status = message.clone();
                state.push_history(message);
                Task::none()
            }
            Message::Exported(Err(err)) => {
                state.status = format!("Export error: {err}");
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let snapshot = state.engine.snapshot();

        let object_list = if snapshot.objects.is_empty() {
            Column::new().push(text("No objects yet").size(12))
        } else {
            snapshot
                .objects
                .iter()
                .fold(Column::new().spacing(4), |col, object| {
                    let marker = if state.pointer.selected == Some(object.id) {
                        "> "
                    } else {
                        ""
                    };
                    col.push(
                        button(text(format!("{marker}{}", object_label(object))).size(13))
                            .on_press(Message::Select(object.id))
                            .width(Length::Fill),
                    )
                })
        };

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let control_column = column![
            text("Controls").size(26),
            row![
                button("Add source").on_press(Message::AddObject(ObjectKind::Source)),
                button("Add perceiver").on_press(Message::AddObject(ObjectKind::Perceiver)),
            ]
            .spacing(8),
            row![
                button(if state.paused { "Resume" } else { "Pause" })
                    .on_press(Message::TogglePause),
                button("Clear").on_press(Message::Clear),
                button("Export").on_press(Message::Export),
            ]
            .spacing(8),
            text(format!(
                "t = {:.2}s | {} wavefronts",
                snapshot.time,
                snapshot.wavefront_count()
            ))
            .size(14),
            text("Objects").size(18),
            Container::new(scrollable(object_list).height(Length::Fixed(150.0))).padding(4),
            state.selection_panel(),
            text(&state.status).size(14),
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(90.0))).padding(4),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(360.0));

        let scene = Canvas::new(Scene {
            snapshot,
            pointer: state.pointer,
        })
        .width(Length::Fixed(CANVAS_WIDTH))
        .height(Length::Fixed(CANVAS_HEIGHT));

        let layout = row![control_column, scene]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn selection_panel(&self) -> Element<'_, Message> {
        let Some(object) = self.selected_object() else {
            return text("Select an object to edit it").size(13).into();
        };

        let mut panel = Column::new()
            .spacing(6)
            .push(text(object_label(&object)).size(18));

        if object.kind == ObjectKind::Source {
            let max = self.engine.config().max_frequency.min(10.0) as f32;
            panel = panel
                .push(text(format!("Frequency {:.2} Hz", object.frequency)).size(13))
                .push(
                    slider(0.0..=max, object.frequency as f32, Message::FrequencyChanged)
                        .step(0.1),
                );
        }

        let heading = if object.speed > 0.0 {
            object.velocity.direction_deg()
        } else {
            self.heading_deg
        };

        panel
            .push(text(format!("Speed {:.0} u/s", object.speed)).size(13))
            .push(slider(0.0..=300.0, object.speed as f32, Message::SpeedChanged).step(1.0))
            .push(text(format!("Heading {:.0}°", heading)).size(13))
            .push(slider(-180.0..=180.0, heading as f32, Message::HeadingChanged).step(1.0))
            .push(
                text(format!(
                    "Acceleration ({:.0}, {:.0}) u/s²",
                    object.acceleration.x, object.acceleration.y
                ))
                .size(13),
            )
            .push(slider(-100.0..=100.0, object.acceleration.x as f32, |v| {
                Message::AccelerationChanged(Axis::X, v)
            }))
            .push(slider(-100.0..=100.0, object.acceleration.y as f32, |v| {
                Message::AccelerationChanged(Axis::Y, v)
            }))
            .push(button("Delete").on_press(Message::DeleteSelected))
            .into()
    }

    fn selected_object(&self) -> Option<ObjectSnapshot> {
        let id = self.pointer.selected?;
        let object = self.engine.object(id)?;
        Some(ObjectSnapshot {
            id,
            kind: object.kind(),
            position: object.position(),
            velocity: object.velocity(),
            acceleration: object.acceleration(),
            speed: object.speed(),
            frequency: object.frequency(),
            wavefronts: Vec::new(),
        })
    }

    fn edit_selected<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut Engine, ObjectId) -> dopplercore::EngineResult<()>,
    {
        if let Some(id) = self.pointer.selected {
            if let Err(err) = edit(&mut self.engine, id) {
                self.status = err.to_string();
            }
        }
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

fn to_vec(point: Point) -> Vec2 {
    Vec2::new(point.x as f64, point.y as f64)
}

fn to_point(vec: Vec2) -> Point {
    Point::new(vec.x as f32, vec.y as f32)
}

fn object_label(object: &ObjectSnapshot) -> String {
    match object.kind {
        ObjectKind::Source => format!("Source {} ({:.2} Hz)", object.id, object.frequency),
        ObjectKind::Perceiver => format!("Perceiver {}", object.id),
    }
}

/// Blue when still, red at or above the speed ceiling.
fn speed_color(speed: f64) -> Color {
    let t = (speed / SPEED_COLOR_CEILING).clamp(0.0, 1.0) as f32;
    Color::from_rgb(0.2 + 0.75 * t, 0.55 - 0.35 * t, 0.95 - 0.75 * t)
}

#[derive(Debug, Deserialize)]
struct ScenarioAck {
    #[serde(default)]
    frames: usize,
    #[serde(default)]
    wavefronts: usize,
}

async fn post_scenario(scenario: Scenario) -> Result<String, String> {
    let client = reqwest::Client::new();
    let response = client
        .post(BRIDGE_URL)
        .json(&scenario)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        let ack = response
            .json::<ScenarioAck>()
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!(
            "Bridge ran {} objects: {} frames, {} wavefronts",
            scenario.objects.len(),
            ack.frames,
            ack.wavefronts
        ))
    } else {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        Err(format!("{}: {}", status, text))
    }
}

/// Canvas program drawing one engine snapshot.
struct Scene {
    snapshot: EngineSnapshot,
    pointer: PointerState,
}

impl canvas::Program<Message> for Scene {
    type State = ();

    fn update(
        &self,
        _state: &mut Self::State,
        event: &canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                let position = cursor.position_in(bounds)?;
                Some(
                    canvas::Action::publish(Message::Pointer(PointerEvent::Pressed(position)))
                        .and_capture(),
                )
            }
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                let position = cursor.position_in(bounds)?;
                Some(canvas::Action::publish(Message::Pointer(
                    PointerEvent::Moved(position),
                )))
            }
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => Some(
                canvas::Action::publish(Message::Pointer(PointerEvent::Released)),
            ),
            _ => None,
        }
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.07, 0.07, 0.07),
        );

        let grid = Path::new(|builder| {
            let mut x = 0.0;
            while x <= bounds.width {
                builder.move_to(Point::new(x, 0.0));
                builder.line_to(Point::new(x, bounds.height));
                x += GRID_SPACING;
            }
            let mut y = 0.0;
            while y <= bounds.height {
                builder.move_to(Point::new(0.0, y));
                builder.line_to(Point::new(bounds.width, y));
                y += GRID_SPACING;
            }
        });
        frame.stroke(
            &grid,
            Stroke::default()
                .with_width(1.0)
                .with_color(Color::from_rgba(1.0, 1.0, 1.0, 0.05)),
        );

        let bound = self.snapshot.visibility_bound.max(1.0);
        for object in &self.snapshot.objects {
            for wave in &object.wavefronts {
                let fade = (1.0 - wave.radius / bound).clamp(0.05, 1.0) as f32;
                let circle = Path::circle(to_point(wave.origin), wave.radius as f32);
                frame.stroke(
                    &circle,
                    Stroke::default()
                        .with_width(1.5)
                        .with_color(Color::from_rgba(0.35, 0.75, 1.0, 0.8 * fade)),
                );
            }
        }

        for object in &self.snapshot.objects {
            let center = to_point(object.position);
            let radius = match object.kind {
                ObjectKind::Source => 10.0,
                ObjectKind::Perceiver => 8.0,
            };

            if object.speed > 0.0 {
                let tip = to_point(object.position + object.velocity * 0.25);
                frame.stroke(
                    &Path::line(center, tip),
                    Stroke::default()
                        .with_width(2.0)
                        .with_color(Color::from_rgba(1.0, 1.0, 1.0, 0.6)),
                );
            }

            let body = Path::circle(center, radius);
            frame.fill(&body, speed_color(object.speed));
            if object.kind == ObjectKind::Perceiver {
                frame.stroke(
                    &body,
                    Stroke::default()
                        .with_width(2.0)
                        .with_color(Color::from_rgb(0.95, 0.85, 0.3)),
                );
            }

            let ring = if self.pointer.selected == Some(object.id) {
                Some(Color::WHITE)
            } else if self.pointer.hovered == Some(object.id) {
                Some(Color::from_rgb(0.6, 0.6, 0.6))
            } else {
                None
            };
            if let Some(color) = ring {
                frame.stroke(
                    &Path::circle(center, radius + 4.0),
                    Stroke::default().with_width(1.5).with_color(color),
                );
            }

            let label = match object.kind {
                ObjectKind::Source => format!("{:.2} Hz", object.frequency),
                ObjectKind::Perceiver => self
                    .snapshot
                    .perceptions
                    .iter()
                    .filter(|record| record.perceiver == object.id)
                    .map(|record| format!("{}: {:.2} Hz", record.source, record.frequency))
                    .collect::<Vec<_>>()
                    .join("\n"),
            };
            if !label.is_empty() {
                frame.fill_text(canvas::Text {
                    content: label,
                    position: Point::new(center.x + radius + 6.0, center.y - radius),
                    color: Color::from_rgb(0.9, 0.9, 0.9),
                    size: Pixels(13.0),
                    ..canvas::Text::default()
                });
            }
        }

        vec![frame.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if self.pointer.dragging.is_some() {
            mouse::Interaction::Grabbing
        } else if self.pointer.hovered.is_some() && cursor.is_over(bounds) {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_color_saturates_at_ceiling() {
        assert_eq!(speed_color(SPEED_COLOR_CEILING), speed_color(10.0 * SPEED_COLOR_CEILING));
        assert_ne!(speed_color(0.0), speed_color(SPEED_COLOR_CEILING));
    }

    #[test]
    fn object_label_shows_source_frequency() {
        let object = ObjectSnapshot {
            id: ObjectId(3),
            kind: ObjectKind::Source,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            speed: 0.0,
            frequency: 1.5,
            wavefronts: Vec::new(),
        };
        assert_eq!(object_label(&object), "Source #3 (1.50 Hz)");
    }
}
