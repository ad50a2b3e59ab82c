//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g. '/api/rendimentos/{income_id}',
//! use [format_endpoint].

/// The income collection: list and create.
pub const INCOMES: &str = "/api/rendimentos";
/// Delete a single income record.
pub const DELETE_INCOME: &str = "/api/rendimentos/{income_id}";
/// Download the income records as CSV.
pub const INCOMES_CSV: &str = "/api/rendimentos/csv";
/// Income totals grouped by source.
pub const INCOMES_BY_SOURCE: &str = "/api/rendimentos/por-fonte";
/// The expense collection: list and create.
pub const EXPENSES: &str = "/api/gastos";
/// Delete a single expense record.
pub const DELETE_EXPENSE: &str = "/api/gastos/{expense_id}";
/// Download the expense records as CSV.
pub const EXPENSES_CSV: &str = "/api/gastos/csv";
/// The fixed expense category catalog.
pub const EXPENSE_CATEGORIES: &str = "/api/gastos/categorias";
/// Expense totals grouped by category.
pub const EXPENSES_BY_CATEGORY: &str = "/api/gastos/por-categoria";
/// The savings account overview.
pub const SAVINGS: &str = "/api/poupanca";
/// Savings movements: list and create.
pub const SAVINGS_MOVEMENTS: &str = "/api/poupanca/movimentacoes";
/// Download the savings movements as CSV.
pub const SAVINGS_MOVEMENTS_CSV: &str = "/api/poupanca/movimentacoes/csv";
/// Update the annual savings rate.
pub const SAVINGS_RATE: &str = "/api/poupanca/taxa";
/// The goal collection: list with plans, and create.
pub const GOALS: &str = "/api/objetivos";
/// One month's income and expense summary.
pub const SUMMARY: &str = "/api/resumo";
/// Summaries for every month that has records.
pub const MONTHLY_SUMMARIES: &str = "/api/resumo/mensal";
/// All-time totals and the savings balance.
pub const OVERVIEW: &str = "/api/resumo/geral";
/// Compound growth projection.
pub const PROJECTION: &str = "/api/projecao";
/// The monthly contribution needed to reach a target.
pub const REQUIRED_CONTRIBUTION: &str = "/api/projecao/aporte";
/// The months needed to reach a target.
pub const REQUIRED_MONTHS: &str = "/api/projecao/tempo";
/// Download the whole ledger document.
pub const BACKUP: &str = "/api/backup";
/// Replace the ledger with an uploaded document.
pub const RESTORE: &str = "/api/backup/restore";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in '/api/rendimentos/{income_id}', '{income_id}' is the
/// parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
