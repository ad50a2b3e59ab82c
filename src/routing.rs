//! Application router configuration wiring every API route to its
//! handler.

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::{
    AppState, endpoints,
    expense::{create_expense, delete_expense, get_categories, get_expenses},
    export::{
        get_backup, get_expenses_csv, get_incomes_csv, get_movements_csv, restore_backup,
    },
    goal::{create_goal, get_goals},
    income::{create_income, delete_income, get_incomes},
    projection::{get_projection, get_required_contribution, get_required_months},
    report::{
        get_expenses_by_category, get_income_by_source, get_monthly_summaries, get_overview,
        get_summary,
    },
    savings::{create_movement, get_movements, get_savings, update_rate},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::INCOMES, get(get_incomes).post(create_income))
        .route(endpoints::DELETE_INCOME, delete(delete_income))
        .route(endpoints::INCOMES_CSV, get(get_incomes_csv))
        .route(endpoints::INCOMES_BY_SOURCE, get(get_income_by_source))
        .route(endpoints::EXPENSES, get(get_expenses).post(create_expense))
        .route(endpoints::DELETE_EXPENSE, delete(delete_expense))
        .route(endpoints::EXPENSES_CSV, get(get_expenses_csv))
        .route(endpoints::EXPENSE_CATEGORIES, get(get_categories))
        .route(
            endpoints::EXPENSES_BY_CATEGORY,
            get(get_expenses_by_category),
        )
        .route(endpoints::SAVINGS, get(get_savings))
        .route(
            endpoints::SAVINGS_MOVEMENTS,
            get(get_movements).post(create_movement),
        )
        .route(endpoints::SAVINGS_MOVEMENTS_CSV, get(get_movements_csv))
        .route(endpoints::SAVINGS_RATE, put(update_rate))
        .route(endpoints::GOALS, get(get_goals).post(create_goal))
        .route(endpoints::SUMMARY, get(get_summary))
        .route(endpoints::MONTHLY_SUMMARIES, get(get_monthly_summaries))
        .route(endpoints::OVERVIEW, get(get_overview))
        .route(endpoints::PROJECTION, get(get_projection))
        .route(
            endpoints::REQUIRED_CONTRIBUTION,
            get(get_required_contribution),
        )
        .route(endpoints::REQUIRED_MONTHS, get(get_required_months))
        .route(endpoints::BACKUP, get(get_backup))
        .route(endpoints::RESTORE, post(restore_backup))
        .with_state(state)
}
