use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::OffsetDateTime;
use time::macros::format_description;
use todosync_core::ViewState;
use todosync_core::config::Palette;
use todosync_core::error::AppError;
use todosync_core::model::Task;

pub const LOADING_MESSAGE: &str = "Loading tasks...";
pub const EMPTY_MESSAGE: &str = "No tasks yet. Add one!";

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Done")]
    done: &'static str,
    #[tabled(rename = "Task")]
    text: String,
    #[tabled(rename = "Created")]
    created: String,
}

pub fn format_created(created_at: OffsetDateTime) -> Result<String, AppError> {
    created_at
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute] UTC"
        ))
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

fn row(task: &Task) -> Result<TaskRow, AppError> {
    Ok(TaskRow {
        id: task.id.to_string(),
        done: if task.completed { "[x]" } else { "[ ]" },
        text: task.text.clone(),
        created: format_created(task.created_at.to_offset(time::UtcOffset::UTC))?,
    })
}

/// Terminal view: error banner, then the loading line, the empty hint or the table.
pub fn render_view(state: &ViewState, palette: &Palette) -> Result<String, AppError> {
    let mut lines = Vec::new();

    if let Some(error) = state.error.as_deref() {
        lines.push(palette.alertize(&format!("Error: {error}")));
    }

    if state.loading {
        lines.push(palette.mutedize(LOADING_MESSAGE));
    } else if state.tasks.is_empty() {
        if state.error.is_none() {
            lines.push(palette.mutedize(EMPTY_MESSAGE));
        }
    } else {
        let rows = state.tasks.iter().map(row).collect::<Result<Vec<_>, _>>()?;
        let mut table = Table::new(rows);
        table.with(Style::sharp());
        lines.push(table.to_string());
    }

    Ok(lines.join("\n"))
}

pub fn view_json(state: &ViewState) -> Result<String, AppError> {
    let payload = serde_json::json!({
        "tasks": state.tasks,
        "error": state.error,
    });
    serde_json::to_string(&payload).map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn task_json(task: &Task) -> Result<String, AppError> {
    serde_json::to_string(task).map_err(|err| AppError::invalid_data(err.to_string()))
}
