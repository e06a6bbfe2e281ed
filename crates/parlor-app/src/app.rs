use rand::rngs::StdRng;
use tracing::info;

use parlor_db::{MessageStore, SharedStore};
use parlor_types::api::{PhoneSubmission, Route};
use parlor_types::events::{ChatEvent, NoticeLevel};

use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::login::LoginFlow;
use crate::session::SessionGate;

/// Top-level router: owns the session context and whichever screen is mounted.
pub struct App {
    config: Config,
    store: MessageStore,
    session: SessionGate,
    dispatcher: Dispatcher,
    route: Route,
    login: LoginFlow<StdRng>,
    dashboard: Option<Dashboard>,
}

impl App {
    pub fn new(kv: SharedStore, config: Config) -> Self {
        let login = LoginFlow::new(config.timings);
        Self::with_login(kv, config, login)
    }

    pub fn with_login(kv: SharedStore, config: Config, login: LoginFlow<StdRng>) -> Self {
        Self {
            store: MessageStore::new(kv.clone()),
            session: SessionGate::new(kv),
            dispatcher: Dispatcher::new(),
            route: Route::Landing,
            login,
            dashboard: None,
            config,
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn session(&self) -> &SessionGate {
        &self.session
    }

    pub fn login(&self) -> &LoginFlow<StdRng> {
        &self.login
    }

    pub fn dashboard(&self) -> Option<&Dashboard> {
        self.dashboard.as_ref()
    }

    pub fn dashboard_mut(&mut self) -> Option<&mut Dashboard> {
        self.dashboard.as_mut()
    }

    /// Go to `requested`, subject to the session gate. Returns where we landed.
    pub fn navigate(&mut self, requested: Route) -> Route {
        let route = self.session.resolve(requested);
        if route != requested {
            info!("Redirected {} -> {}", requested.path(), route.path());
        }

        match route {
            Route::Dashboard if self.dashboard.is_none() => {
                let dashboard = Dashboard::mount(
                    self.store.clone(),
                    self.config.clone(),
                    self.dispatcher.clone(),
                );
                dashboard.publish_users();
                self.dashboard = Some(dashboard);
            }
            Route::Landing => self.dashboard = None,
            Route::Dashboard => {}
        }

        self.route = route;
        self.dispatcher.broadcast(ChatEvent::Navigate { route });
        route
    }

    /// Phone step of the login form. Returns the code to show on screen.
    pub async fn submit_phone(&mut self, submission: &PhoneSubmission) -> Result<String> {
        let code = self
            .dispatcher
            .report(self.login.send_code(submission).await)?;
        self.dispatcher
            .notify(NoticeLevel::Info, format!("OTP sent: {}", code));
        Ok(code)
    }

    /// Code step of the login form. On success the dashboard is mounted.
    pub async fn submit_otp(&mut self, otp: &str) -> Result<Route> {
        let target = self
            .dispatcher
            .report(self.login.verify(otp, &self.session).await)?;
        self.dispatcher.notify(NoticeLevel::Success, "OTP verified! 🎉");
        Ok(self.navigate(target))
    }

    pub fn logout(&mut self) -> Result<Route> {
        let target = match self.dashboard.as_mut() {
            Some(dashboard) => dashboard.logout(&self.session)?,
            None => {
                self.session.sign_out()?;
                Route::Landing
            }
        };
        Ok(self.navigate(target))
    }
}
