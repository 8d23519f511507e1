/// Database models for SnackFund
///
/// Each model owns its SQL. Ledger models filter every query by `team_id`,
/// so a row from another team is indistinguishable from a missing one.
///
/// # Models
///
/// - `user`: accounts, profiles and password reset state
/// - `team`: teams
/// - `membership`: per-(team, user) role flags and active status
/// - `bank_account`: one registered account per member per team
/// - `expense`: money members spent for the team
/// - `payment`: money members paid into the fund
/// - `rule`: finable team rules
/// - `rule_violation`: fines charged against members
/// - `snack`: snack purchases with per-member contributions

pub mod bank_account;
pub mod expense;
pub mod membership;
pub mod payment;
pub mod rule;
pub mod rule_violation;
pub mod snack;
pub mod team;
pub mod user;
