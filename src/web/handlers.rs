use askama::Template;
use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info, warn};

use super::templates::{HomeTemplate, TasksTemplate};
use super::AppState;
use crate::auth::{AuthenticatedSession, CurrentSession, SessionId};
use crate::error::AppResult;
use crate::google_calendar::time::local_to_utc;
use crate::google_calendar::NewTask;

pub const TASK_ADDED: &str = "Task added successfully!";
pub const TASK_DELETED: &str = "Task deleted successfully!";

/// Handler for the home page
pub async fn home_handler(session: CurrentSession) -> AppResult<Html<String>> {
    let user_name = session
        .data
        .user
        .as_ref()
        .filter(|_| session.data.is_authenticated())
        .map(|user| user.display_name().to_string());

    Ok(Html(HomeTemplate { user_name }.render()?))
}

/// Send the browser to the identity provider
pub async fn login_handler(
    State(state): State<AppState>,
    session: CurrentSession,
    jar: CookieJar,
) -> AppResult<(CookieJar, Redirect)> {
    let id = session.id.unwrap_or_else(SessionId::generate);
    let mut data = session.data;

    let oauth_state = uuid::Uuid::new_v4().simple().to_string();
    data.oauth_state = Some(oauth_state.clone());
    state.sessions.save(&id, &data).await?;

    let authorize_url = state.identity.authorize_url(&oauth_state)?;
    info!("Redirecting session {} to the identity provider", id);

    Ok((jar.add(state.cookies.cookie(&id)?), Redirect::to(authorize_url.as_str())))
}

/// Query parameters of the provider's redirect back to us
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Finish the login: check state, exchange the code and remember the user
pub async fn callback_handler(
    State(state): State<AppState>,
    session: CurrentSession,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> AppResult<Response> {
    if let Some(err) = params.error {
        warn!("Identity provider returned an error: {}", err);
        return Ok((StatusCode::BAD_REQUEST, format!("Error: authorization failed: {}", err)).into_response());
    }

    let (Some(old_id), Some(expected)) = (session.id, session.data.oauth_state.clone()) else {
        warn!("Callback without a pending login");
        return Ok((StatusCode::BAD_REQUEST, "Error: no login in progress").into_response());
    };

    if params.state.as_deref() != Some(expected.as_str()) {
        warn!("OAuth state mismatch for session {}", old_id);
        return Ok((StatusCode::BAD_REQUEST, "Error: invalid OAuth state").into_response());
    }

    let Some(code) = params.code else {
        return Ok((StatusCode::BAD_REQUEST, "Error: missing authorization code").into_response());
    };

    let token = state.identity.exchange_code(&code).await?;
    let user = state.identity.fetch_profile(&token).await?;
    info!("User {} signed in", user.display_name());

    let mut data = session.data;
    data.oauth_state = None;
    data.user_token = Some(token);
    data.user = Some(user);

    // Fresh ID for the signed-in session
    let new_id = SessionId::generate();
    state.sessions.save(&new_id, &data).await?;
    state.sessions.remove(&old_id).await?;

    Ok((jar.add(state.cookies.cookie(&new_id)?), Redirect::to("/")).into_response())
}

/// Forget the user and token, keeping the session itself
pub async fn logout_handler(
    State(state): State<AppState>,
    session: CurrentSession,
) -> AppResult<Redirect> {
    if let Some(id) = session.id {
        let mut data = session.data;
        data.log_out();
        state.sessions.save(&id, &data).await?;
        info!("Session {} logged out", id);
    }

    Ok(Redirect::to("/"))
}

#[derive(Debug, Deserialize)]
pub struct TasksQuery {
    pub message: Option<String>,
}

/// List upcoming tasks
pub async fn tasks_list_handler(
    State(state): State<AppState>,
    mut session: AuthenticatedSession,
    Query(query): Query<TasksQuery>,
) -> AppResult<Response> {
    let token = state.tokens.fresh_token(&mut session).await?;

    match state
        .calendar
        .list_upcoming(&token, Utc::now(), state.config.max_tasks)
        .await
    {
        Ok(tasks) => {
            let page = TasksTemplate {
                tasks,
                message: query.message.filter(|m| !m.is_empty()),
            };
            Ok(Html(page.render()?).into_response())
        }
        Err(e) => {
            error!("Error fetching tasks: {}", e);
            Ok((StatusCode::BAD_GATEWAY, format!("Error fetching tasks: {}", e)).into_response())
        }
    }
}

/// Fields of the add-task form
#[derive(Debug, Deserialize)]
pub struct TaskForm {
    /// Missing titles are accepted; the event is inserted without a summary
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// `datetime-local` value, `YYYY-MM-DDTHH:MM[:SS]`
    pub due_date: String,
}

/// Add a task from the form
pub async fn tasks_create_handler(
    State(state): State<AppState>,
    mut session: AuthenticatedSession,
    Form(form): Form<TaskForm>,
) -> AppResult<Response> {
    let token = state.tokens.fresh_token(&mut session).await?;

    let due = match local_to_utc(&form.due_date, state.config.timezone) {
        Ok(due) => due,
        Err(e) => {
            error!("Error converting time: {}", e);
            return Ok((StatusCode::BAD_REQUEST, format!("Error: {}", e)).into_response());
        }
    };

    let task = NewTask {
        title: form.title,
        description: form.description.filter(|d| !d.is_empty()),
        due,
    };

    let message = match state.calendar.create(&token, &task).await {
        Ok(_) => TASK_ADDED.to_string(),
        Err(e) => {
            error!("Error adding task: {}", e);
            format!("Error adding task: {}", e)
        }
    };

    let page = TasksTemplate {
        tasks: Vec::new(),
        message: Some(message),
    };
    Ok(Html(page.render()?).into_response())
}

/// Delete a task and go back to the list
pub async fn delete_task_handler(
    State(state): State<AppState>,
    mut session: AuthenticatedSession,
    Path(task_id): Path<String>,
) -> AppResult<Redirect> {
    let token = state.tokens.fresh_token(&mut session).await?;

    let message = match state.calendar.delete(&token, &task_id).await {
        Ok(()) => TASK_DELETED.to_string(),
        Err(e) => {
            error!("Error deleting task {}: {}", task_id, e);
            format!("Error deleting task: {}", e)
        }
    };

    Ok(Redirect::to(&format!(
        "/tasks?message={}",
        urlencoding::encode(&message)
    )))
}

// Handler for API health check
pub async fn health_handler() -> &'static str {
    "OK"
}
