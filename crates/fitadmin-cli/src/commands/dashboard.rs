use fitadmin_core::dashboard::{load_dashboard, DashboardStats};
use fitadmin_core::routes::Route;

use crate::commands::common::{Console, TerminalNotifier};
use crate::error::CliError;

pub async fn run_dashboard(console: &Console, as_json: bool) -> Result<(), CliError> {
    console.enter(Route::Dashboard)?;
    let backend = console.backend()?;
    let Some(stats) = load_dashboard(&backend, &TerminalNotifier).await else {
        return Err(CliError::Incomplete("Dashboard data is unavailable".to_string()));
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        for line in format_dashboard_lines(&stats) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn format_dashboard_lines(stats: &DashboardStats) -> Vec<String> {
    let top = &stats.top_section;
    let mut lines = vec![
        format!(
            "Users          {} total, {} today, {} premium, {} free",
            top.total_users.get(),
            top.users_today.get(),
            top.premium_users.get(),
            top.non_premium_users.get()
        ),
        format!(
            "Registrations  {} last 7 days, {} last month",
            top.registered_last_7_days.get(),
            top.registered_last_month.get()
        ),
        format!(
            "Subscriptions  {} active, {} inactive",
            top.active_subscriptions.get(),
            top.inactive_subscriptions.get()
        ),
        format!(
            "Content        {} exercise blocks, {} meals",
            top.total_exercises.get(),
            top.total_meals.get()
        ),
        format!("Income         {}", top.total_income.as_str()),
    ];

    if !stats.bottom_section.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "{:<20}  {:>7}  {:>11}  {:>7}  {:>10}",
            "Country", "Users", "Subscribers", "Active", "Income"
        ));
        for row in &stats.bottom_section {
            lines.push(format!(
                "{:<20}  {:>7}  {:>11}  {:>7}  {:>10}",
                row.country,
                row.total_users.get(),
                row.subscribers.get(),
                row.active_users.get(),
                row.income.as_str()
            ));
        }
    }
    lines
}
