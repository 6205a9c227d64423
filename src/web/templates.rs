use crate::google_calendar::Task;
use askama::Template;

/// Landing page
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    /// Greeting name, `None` when signed out
    pub user_name: Option<String>,
}

/// Task form and upcoming task list
#[derive(Template)]
#[template(path = "tasks.html")]
pub struct TasksTemplate {
    pub tasks: Vec<Task>,
    pub message: Option<String>,
}
