//! Main GTK4 application for the kiosk

use gtk4::glib;
use gtk4::prelude::*;
use tracing::{debug, info, warn};

use crate::frontend::UiLink;
use crate::state::{format_remaining, FrontendState};

/// CSS styling for the kiosk
const KIOSK_CSS: &str = r#"
window {
    background-color: #1a1a2e;
}

.page {
    padding: 48px;
}

.client-name {
    color: #ffffff;
    font-size: 28px;
    font-weight: 600;
}

.status-label {
    color: #888888;
    font-size: 18px;
}

.error-label {
    color: #ff6b6b;
    font-size: 16px;
}

.login-entry {
    min-width: 320px;
    font-size: 18px;
}

.action-button {
    background-color: #16213e;
    color: #ffffff;
    border-radius: 12px;
    padding: 12px 32px;
    font-size: 18px;
}

.action-button:hover {
    background-color: #1f3460;
}

.session-user {
    color: #ffffff;
    font-size: 16px;
}

.time-display {
    font-family: monospace;
    font-size: 22px;
    color: #88c0d0;
}

.time-display.time-warning {
    color: #ebcb8b;
}

.warning-banner {
    background-color: rgba(255, 107, 107, 0.2);
    color: #ff6b6b;
    border-radius: 4px;
    padding: 4px 12px;
}
"#;

const STATUS_WIDTH: i32 = 360;
const STATUS_HEIGHT: i32 = 200;

/// The kiosk application; owns the GTK main loop
pub struct KioskApp {
    link: UiLink,
}

impl KioskApp {
    pub fn new(link: UiLink) -> Self {
        Self { link }
    }

    /// Run until the session machine closes the frontend
    pub fn run(&self) -> i32 {
        let app = gtk4::Application::builder()
            .application_id("no.deichman.mycel.client")
            .build();

        let link = self.link.clone();
        app.connect_activate(move |app| {
            Self::build_ui(app, link.clone());
        });

        // Command line belongs to the client binary, not to GTK
        app.run_with_args::<&str>(&[]).into()
    }

    fn build_ui(app: &gtk4::Application, link: UiLink) {
        let provider = gtk4::CssProvider::new();
        provider.load_from_data(KIOSK_CSS);
        match gtk4::gdk::Display::default() {
            Some(display) => gtk4::style_context_add_provider_for_display(
                &display,
                &provider,
                gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
            ),
            None => warn!("No default display, running unstyled"),
        }

        let window = gtk4::ApplicationWindow::builder()
            .application(app)
            .title("Mycel")
            .default_width(1280)
            .default_height(720)
            .build();
        window.fullscreen();

        // Patrons leave through the logout button, never the window manager
        window.connect_close_request(|_| glib::Propagation::Stop);

        let stack = gtk4::Stack::new();
        stack.set_transition_type(gtk4::StackTransitionType::Crossfade);
        stack.set_transition_duration(200);

        let views = Views::build(&link);
        stack.add_named(&views.starting, Some("starting"));
        stack.add_named(&views.login.container, Some("login"));
        stack.add_named(&views.short_time.container, Some("shorttime"));
        stack.add_named(&views.session.container, Some("session"));
        stack.add_named(&views.notice.0, Some("notice"));
        window.set_child(Some(&stack));

        let mut receiver = link.state().subscribe();
        let app_weak = app.downgrade();
        let window_weak = window.downgrade();
        let stack_weak = stack.downgrade();

        glib::spawn_future_local(async move {
            loop {
                let state = receiver.borrow_and_update().clone();
                let (Some(window), Some(stack)) = (window_weak.upgrade(), stack_weak.upgrade())
                else {
                    break;
                };

                if state == FrontendState::Closed {
                    info!("Frontend closed, leaving main loop");
                    if let Some(app) = app_weak.upgrade() {
                        app.quit();
                    }
                    break;
                }

                views.render(&state);
                stack.set_visible_child_name(state.page());
                if matches!(state, FrontendState::Session { .. }) {
                    window.unfullscreen();
                    window.set_default_size(STATUS_WIDTH, STATUS_HEIGHT);
                } else {
                    window.fullscreen();
                }

                if receiver.changed().await.is_err() {
                    debug!("Frontend state dropped");
                    break;
                }
            }
        });

        window.present();
    }
}

struct LoginView {
    container: gtk4::Box,
    client_name: gtk4::Label,
    username: gtk4::Entry,
    password: gtk4::PasswordEntry,
    message: gtk4::Label,
}

struct ShortTimeView {
    container: gtk4::Box,
    client_name: gtk4::Label,
    minutes: gtk4::Label,
}

struct SessionPage {
    container: gtk4::Box,
    title: gtk4::Label,
    remaining: gtk4::Label,
    warning: gtk4::Label,
}

struct Views {
    starting: gtk4::Box,
    login: LoginView,
    short_time: ShortTimeView,
    session: SessionPage,
    notice: (gtk4::Box, gtk4::Label),
}

impl Views {
    fn build(link: &UiLink) -> Self {
        Self {
            starting: create_starting_view(),
            login: create_login_view(link),
            short_time: create_short_time_view(link),
            session: create_session_view(link),
            notice: create_notice_view(),
        }
    }

    fn render(&self, state: &FrontendState) {
        match state {
            FrontendState::Starting | FrontendState::Closed => {}
            FrontendState::Login {
                client_name,
                message,
            } => {
                let login = &self.login;
                login.client_name.set_text(client_name);
                login.password.set_text("");
                login.message.set_text(message.as_deref().unwrap_or(""));
                login.message.set_visible(message.is_some());
                login.username.grab_focus();
            }
            FrontendState::ShortTime {
                client_name,
                minutes,
            } => {
                self.short_time.client_name.set_text(client_name);
                self.short_time
                    .minutes
                    .set_text(&format!("You can use this terminal for {}", format_remaining(*minutes)));
            }
            FrontendState::Session {
                view,
                minutes,
                low_time,
                warning,
            } => {
                let session = &self.session;
                session
                    .title
                    .set_text(&format!("{} @ {}", view.user, view.client_name));
                session.remaining.set_text(&format_remaining(*minutes));
                if *low_time {
                    session.remaining.add_css_class("time-warning");
                } else {
                    session.remaining.remove_css_class("time-warning");
                }
                session.warning.set_text(warning.as_deref().unwrap_or(""));
                session.warning.set_visible(warning.is_some());
            }
            FrontendState::Notice { message } => {
                self.notice.1.set_text(message);
            }
        }
    }
}

fn centered_page(spacing: i32) -> gtk4::Box {
    let container = gtk4::Box::new(gtk4::Orientation::Vertical, spacing);
    container.set_halign(gtk4::Align::Center);
    container.set_valign(gtk4::Align::Center);
    container.add_css_class("page");
    container
}

fn create_starting_view() -> gtk4::Box {
    let container = centered_page(16);

    let spinner = gtk4::Spinner::new();
    spinner.set_spinning(true);
    container.append(&spinner);

    let label = gtk4::Label::new(Some("Starting..."));
    label.add_css_class("status-label");
    container.append(&label);

    container
}

fn create_login_view(link: &UiLink) -> LoginView {
    let container = centered_page(16);

    let client_name = gtk4::Label::new(None);
    client_name.add_css_class("client-name");
    container.append(&client_name);

    let username = gtk4::Entry::new();
    username.set_placeholder_text(Some("Library card number or username"));
    username.add_css_class("login-entry");
    container.append(&username);

    let password = gtk4::PasswordEntry::new();
    password.set_show_peek_icon(true);
    password.add_css_class("login-entry");
    container.append(&password);

    let button = gtk4::Button::with_label("Log in");
    button.add_css_class("action-button");
    container.append(&button);

    let message = gtk4::Label::new(None);
    message.add_css_class("error-label");
    message.set_wrap(true);
    message.set_max_width_chars(40);
    message.set_visible(false);
    container.append(&message);

    let submit = {
        let link = link.clone();
        let username = username.clone();
        let password = password.clone();
        move || {
            let user = username.text();
            if user.trim().is_empty() {
                return;
            }
            link.submit_credentials(&user, &password.text());
            password.set_text("");
        }
    };

    let on_click = submit.clone();
    button.connect_clicked(move |_| on_click());
    let on_enter = submit.clone();
    password.connect_activate(move |_| on_enter());
    let password_focus = password.clone();
    username.connect_activate(move |_| {
        password_focus.grab_focus();
    });

    LoginView {
        container,
        client_name,
        username,
        password,
        message,
    }
}

fn create_short_time_view(link: &UiLink) -> ShortTimeView {
    let container = centered_page(24);

    let client_name = gtk4::Label::new(None);
    client_name.add_css_class("client-name");
    container.append(&client_name);

    let minutes = gtk4::Label::new(None);
    minutes.add_css_class("status-label");
    container.append(&minutes);

    let button = gtk4::Button::with_label("Start");
    button.add_css_class("action-button");
    let link = link.clone();
    button.connect_clicked(move |_| link.start_short_time());
    container.append(&button);

    ShortTimeView {
        container,
        client_name,
        minutes,
    }
}

fn create_session_view(link: &UiLink) -> SessionPage {
    let container = centered_page(12);

    let title = gtk4::Label::new(None);
    title.add_css_class("session-user");
    container.append(&title);

    let remaining = gtk4::Label::new(Some("--"));
    remaining.add_css_class("time-display");
    container.append(&remaining);

    let warning = gtk4::Label::new(None);
    warning.add_css_class("warning-banner");
    warning.set_wrap(true);
    warning.set_max_width_chars(36);
    warning.set_visible(false);
    container.append(&warning);

    let button = gtk4::Button::with_label("Log out");
    button.add_css_class("action-button");
    let link = link.clone();
    button.connect_clicked(move |_| link.request_logout());
    container.append(&button);

    SessionPage {
        container,
        title,
        remaining,
        warning,
    }
}

fn create_notice_view() -> (gtk4::Box, gtk4::Label) {
    let container = centered_page(16);

    let icon = gtk4::Image::from_icon_name("dialog-error");
    icon.set_pixel_size(64);
    container.append(&icon);

    let label = gtk4::Label::new(None);
    label.add_css_class("error-label");
    label.set_wrap(true);
    label.set_max_width_chars(48);
    container.append(&label);

    (container, label)
}
