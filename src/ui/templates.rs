// Askama template definitions

use askama::Template;

use crate::db::{TrackedFish, UserResponse};

// Home page for logged-in users
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub user: UserResponse,
}

// Home page for anonymous visitors
#[derive(Template)]
#[template(path = "home_anon.html")]
pub struct HomeAnonTemplate;

// Login form
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

// Registration form, sticky on error
#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
    pub username: String,
    pub email: String,
}

// Track board
#[derive(Template)]
#[template(path = "track.html")]
pub struct TrackTemplate {
    pub user: UserResponse,
    pub fish: Vec<TrackedFish>,
    pub caught_count: usize,
}

impl TrackTemplate {
    pub fn total(&self) -> usize {
        self.fish.len()
    }
}
