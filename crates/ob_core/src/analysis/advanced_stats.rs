//! # Advanced Statistics
//!
//! Closed-form efficiency and impact metrics computed from counting stats.
//!
//! ## Conventions
//!
//! - Every function is total: a zero (or non-finite) denominator yields 0.0,
//!   never NaN or a panic.
//! - Percentages are scaled to 100 and capped to [0, 100]. Small windows
//!   (or an all-threes shooting line for eFG%) can mathematically exceed
//!   100; the cap keeps downstream features bounded.
//! - Team-relative percentages (ORB%, DRB%, TRB%, AST%, STL%, BLK%, USG%)
//!   follow the box-score convention of normalizing by the player's share of
//!   team minutes, `MP / (Team MP / 5)`.
//! - `box_plus_minus` is a game-score composite: game score per 100 team
//!   possessions minus a configurable baseline.

use crate::config::MetricsConfig;
use crate::models::{EntityKind, StatLine};
use serde::{Deserialize, Serialize};

/// Free-throw attempt weight used by possession and true-shooting estimates.
pub const FTA_WEIGHT: f64 = 0.44;

/// Regulation game length in minutes, used to normalize pace.
pub const GAME_MINUTES: f64 = 48.0;

#[inline]
fn ratio(num: f64, den: f64) -> f64 {
    if den <= 0.0 || !den.is_finite() || !num.is_finite() {
        return 0.0;
    }
    num / den
}

#[inline]
fn pct(num: f64, den: f64) -> f64 {
    (ratio(num, den) * 100.0).clamp(0.0, 100.0)
}

/// TS% = pts / (2 × (fga + 0.44×fta)) × 100
pub fn true_shooting_pct(pts: u32, fga: u32, fta: u32) -> f64 {
    pct(pts as f64, 2.0 * true_shooting_attempts(fga, fta))
}

/// eFG% = (fgm + 0.5×fg3m) / fga × 100
pub fn effective_fg_pct(fgm: u32, fg3m: u32, fga: u32) -> f64 {
    pct(fgm as f64 + 0.5 * fg3m as f64, fga as f64)
}

/// TSA = fga + 0.44×fta
pub fn true_shooting_attempts(fga: u32, fta: u32) -> f64 {
    fga as f64 + FTA_WEIGHT * fta as f64
}

/// TOV% = tov / (fga + 0.44×fta + tov) × 100
pub fn turnover_rate(tov: u32, fga: u32, fta: u32) -> f64 {
    pct(tov as f64, true_shooting_attempts(fga, fta) + tov as f64)
}

/// Hollinger game score.
pub fn game_score(line: &StatLine) -> f64 {
    let missed_ft = line.fta.saturating_sub(line.ftm) as f64;
    line.pts as f64 + 0.4 * line.fgm as f64 - 0.7 * line.fga as f64 - 0.4 * missed_ft
        + 0.7 * line.oreb as f64
        + 0.3 * line.dreb as f64
        + line.stl as f64
        + 0.7 * line.ast as f64
        + 0.7 * line.blk as f64
        - 0.4 * line.pf as f64
        - line.tov as f64
}

/// AST/TOV; with no turnovers the assist count itself is returned.
pub fn assist_turnover_ratio(ast: u32, tov: u32) -> f64 {
    if tov == 0 {
        return ast as f64;
    }
    ast as f64 / tov as f64
}

/// Possessions = fga − oreb + tov + 0.44×fta
///
/// Negative for a short window with more offensive rebounds than shots.
/// Ratings divide by it and so read 0 for a non-positive count; pace scales
/// it as is.
pub fn possessions(fga: u32, oreb: u32, tov: u32, fta: u32) -> f64 {
    fga as f64 - oreb as f64 + tov as f64 + FTA_WEIGHT * fta as f64
}

pub fn possessions_of(line: &StatLine) -> f64 {
    possessions(line.fga, line.oreb, line.tov, line.fta)
}

/// Pace = possessions × (48 / minutes)
pub fn pace(possessions: f64, minutes: f64) -> f64 {
    ratio(possessions * GAME_MINUTES, minutes)
}

/// Points scored per 100 possessions.
pub fn offensive_rating(points: u32, possessions: f64) -> f64 {
    ratio(points as f64, possessions) * 100.0
}

/// Points allowed per 100 possessions.
pub fn defensive_rating(opponent_points: u32, possessions: f64) -> f64 {
    ratio(opponent_points as f64, possessions) * 100.0
}

/// FTr = fta / fga
pub fn free_throw_rate(fta: u32, fga: u32) -> f64 {
    ratio(fta as f64, fga as f64)
}

/// Dean Oliver's four factors for one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FourFactors {
    pub efg_pct: f64,
    pub tov_pct: f64,
    pub orb_pct: f64,
    pub ft_rate: f64,
}

pub fn four_factors(team: &StatLine, opponent: &StatLine) -> FourFactors {
    FourFactors {
        efg_pct: effective_fg_pct(team.fgm, team.fg3m, team.fga),
        tov_pct: turnover_rate(team.tov, team.fga, team.fta),
        orb_pct: pct(team.oreb as f64, (team.oreb + opponent.dreb) as f64),
        ft_rate: free_throw_rate(team.fta, team.fga),
    }
}

/// Team and opponent lines over the same window as the row being derived.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TeamContext {
    pub team: StatLine,
    pub opponent: StatLine,
    /// Game minutes covered by the window
    pub game_minutes: f64,
}

impl TeamContext {
    /// Total player-minutes for the team, falling back to five players
    /// for the whole window when the source does not track team minutes.
    pub fn team_minutes(&self) -> f64 {
        if self.team.minutes > 0.0 {
            self.team.minutes
        } else {
            self.game_minutes * 5.0
        }
    }

    pub fn team_possessions(&self) -> f64 {
        possessions_of(&self.team)
    }

    pub fn opponent_possessions(&self) -> f64 {
        possessions_of(&self.opponent)
    }
}

/// All derived metrics carried on an interval row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub ts_pct: f64,
    pub efg_pct: f64,
    pub ts_attempts: f64,
    pub tov_pct: f64,
    pub game_score: f64,
    pub ast_to_ratio: f64,
    pub possessions: f64,
    pub pace: f64,
    pub off_rating: f64,
    pub def_rating: f64,
    pub ft_rate: f64,
    pub orb_pct: f64,
    pub drb_pct: f64,
    pub trb_pct: f64,
    pub ast_pct: f64,
    pub stl_pct: f64,
    pub blk_pct: f64,
    pub usg_pct: f64,
    pub box_plus_minus: f64,
}

/// Stateless calculator binding the metric tunables.
#[derive(Debug, Clone, Default)]
pub struct AdvancedStatsCalculator {
    config: MetricsConfig,
}

impl AdvancedStatsCalculator {
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    /// Metrics that need nothing but the row's own line.
    pub fn individual(&self, line: &StatLine) -> DerivedMetrics {
        let poss = possessions_of(line);
        DerivedMetrics {
            ts_pct: true_shooting_pct(line.pts, line.fga, line.fta),
            efg_pct: effective_fg_pct(line.fgm, line.fg3m, line.fga),
            ts_attempts: true_shooting_attempts(line.fga, line.fta),
            tov_pct: turnover_rate(line.tov, line.fga, line.fta),
            game_score: game_score(line),
            ast_to_ratio: assist_turnover_ratio(line.ast, line.tov),
            possessions: poss,
            pace: pace(poss, line.minutes),
            off_rating: offensive_rating(line.pts, poss),
            ft_rate: free_throw_rate(line.fta, line.fga),
            ..Default::default()
        }
    }

    /// Full metric set for a row, using team context when available.
    pub fn derive(&self, line: &StatLine, kind: EntityKind, ctx: Option<&TeamContext>) -> DerivedMetrics {
        let mut metrics = self.individual(line);
        let Some(ctx) = ctx else {
            return metrics;
        };

        match kind {
            EntityKind::Team => self.apply_team(&mut metrics, line, ctx),
            EntityKind::Player => self.apply_player(&mut metrics, line, ctx),
        }
        metrics
    }

    fn apply_team(&self, m: &mut DerivedMetrics, team: &StatLine, ctx: &TeamContext) {
        let opp = &ctx.opponent;
        let poss = possessions_of(team);
        m.pace = pace(poss, ctx.game_minutes);
        m.off_rating = offensive_rating(team.pts, poss);
        m.def_rating = defensive_rating(opp.pts, poss);
        m.orb_pct = four_factors(team, opp).orb_pct;
        m.drb_pct = pct(team.dreb as f64, (team.dreb + opp.oreb) as f64);
        m.trb_pct = pct(team.reb() as f64, (team.reb() + opp.reb()) as f64);
        m.ast_pct = pct(team.ast as f64, team.fgm as f64);
        m.stl_pct = pct(team.stl as f64, possessions_of(opp));
        m.blk_pct = pct(team.blk as f64, opp.fga.saturating_sub(opp.fg3a) as f64);
        m.usg_pct = if team.fga + team.fta + team.tov > 0 { 100.0 } else { 0.0 };
        m.box_plus_minus = self.box_composite(team, poss);
    }

    fn apply_player(&self, m: &mut DerivedMetrics, line: &StatLine, ctx: &TeamContext) {
        let team = &ctx.team;
        let opp = &ctx.opponent;
        let mp = line.minutes;
        let share = ratio(ctx.team_minutes(), 5.0);
        let team_poss = ctx.team_possessions();

        m.pace = pace(team_poss, ctx.game_minutes);
        m.def_rating = defensive_rating(opp.pts, team_poss);
        m.orb_pct = pct(line.oreb as f64 * share, mp * (team.oreb + opp.dreb) as f64);
        m.drb_pct = pct(line.dreb as f64 * share, mp * (team.dreb + opp.oreb) as f64);
        m.trb_pct = pct(line.reb() as f64 * share, mp * (team.reb() + opp.reb()) as f64);
        m.ast_pct = pct(
            line.ast as f64,
            ratio(mp, share) * team.fgm as f64 - line.fgm as f64,
        );
        m.stl_pct = pct(line.stl as f64 * share, mp * ctx.opponent_possessions());
        m.blk_pct = pct(
            line.blk as f64 * share,
            mp * opp.fga.saturating_sub(opp.fg3a) as f64,
        );
        m.usg_pct = pct(
            (true_shooting_attempts(line.fga, line.fta) + line.tov as f64) * share,
            mp * (true_shooting_attempts(team.fga, team.fta) + team.tov as f64),
        );
        m.box_plus_minus = self.box_composite(line, team_poss);
    }

    fn box_composite(&self, line: &StatLine, team_possessions: f64) -> f64 {
        if team_possessions <= 0.0 {
            return 0.0;
        }
        game_score(line) / team_possessions * 100.0 - self.config.bpm_baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_true_shooting_scenario() {
        // 8 points on 6 FGA, no free throws
        let ts = true_shooting_pct(8, 6, 0);
        assert!(approx(ts, 8.0 / 12.0 * 100.0));
        assert!((ts - 66.7).abs() < 0.05);
    }

    #[test]
    fn test_effective_fg() {
        assert!(approx(effective_fg_pct(3, 2, 6), 4.0 / 6.0 * 100.0));
    }

    #[test]
    fn test_zero_denominators_yield_zero() {
        assert_eq!(true_shooting_pct(0, 0, 0), 0.0);
        assert_eq!(effective_fg_pct(0, 0, 0), 0.0);
        assert_eq!(turnover_rate(0, 0, 0), 0.0);
        assert_eq!(pace(10.0, 0.0), 0.0);
        assert_eq!(offensive_rating(10, 0.0), 0.0);
        assert_eq!(defensive_rating(10, 0.0), 0.0);
        assert_eq!(free_throw_rate(3, 0), 0.0);
        let m = AdvancedStatsCalculator::default().individual(&StatLine::default());
        assert!(!m.ts_pct.is_nan() && !m.pace.is_nan());
    }

    #[test]
    fn test_ast_to_without_turnovers() {
        assert_eq!(assist_turnover_ratio(7, 0), 7.0);
        assert_eq!(assist_turnover_ratio(0, 0), 0.0);
        assert!(approx(assist_turnover_ratio(6, 4), 1.5));
    }

    #[test]
    fn test_game_score_formula() {
        let line = StatLine {
            pts: 20,
            fgm: 8,
            fga: 15,
            ftm: 3,
            fta: 4,
            oreb: 2,
            dreb: 5,
            ast: 6,
            stl: 1,
            blk: 1,
            tov: 3,
            pf: 2,
            ..Default::default()
        };
        let expected = 20.0 + 3.2 - 10.5 - 0.4 + 1.4 + 1.5 + 1.0 + 4.2 + 0.7 - 0.8 - 3.0;
        assert!(approx(game_score(&line), expected));
    }

    #[test]
    fn test_possessions_pace_and_ratings() {
        let poss = possessions(85, 10, 14, 25);
        assert!(approx(poss, 85.0 - 10.0 + 14.0 + 11.0));
        assert!(approx(pace(poss, 48.0), poss));
        assert!(approx(pace(poss, 24.0), poss * 2.0));
        assert!(approx(offensive_rating(110, 100.0), 110.0));
        assert!(approx(defensive_rating(95, 100.0), 95.0));
    }

    #[test]
    fn test_negative_possessions_kept_raw() {
        assert!(approx(possessions(0, 1, 0, 0), -1.0));
        let line = StatLine { oreb: 1, pts: 2, minutes: 1.0, ..Default::default() };
        let m = AdvancedStatsCalculator::default().individual(&line);
        assert!(approx(m.possessions, -1.0));
        assert!(approx(m.pace, -48.0));
        assert_eq!(m.off_rating, 0.0);
    }

    #[test]
    fn test_four_factors() {
        let team = StatLine { fgm: 40, fg3m: 10, fga: 90, fta: 20, tov: 12, oreb: 10, ..Default::default() };
        let opp = StatLine { dreb: 30, ..Default::default() };
        let ff = four_factors(&team, &opp);
        assert!(approx(ff.efg_pct, 45.0 / 90.0 * 100.0));
        assert!(approx(ff.orb_pct, 25.0));
        assert!(approx(ff.ft_rate, 20.0 / 90.0));
        assert!(approx(ff.tov_pct, 12.0 / (90.0 + 8.8 + 12.0) * 100.0));
    }

    #[test]
    fn test_player_team_relative_percentages() {
        let calc = AdvancedStatsCalculator::default();
        let player = StatLine { minutes: 24.0, oreb: 2, ast: 5, fgm: 4, fga: 10, ..Default::default() };
        let ctx = TeamContext {
            team: StatLine { minutes: 240.0, oreb: 10, fgm: 40, fga: 85, ..Default::default() },
            opponent: StatLine { dreb: 30, ..Default::default() },
            game_minutes: 48.0,
        };
        let m = calc.derive(&player, EntityKind::Player, Some(&ctx));
        // 100 * (2 * 48) / (24 * 40)
        assert!(approx(m.orb_pct, 10.0));
        // 100 * 5 / ((24 / 48) * 40 - 4)
        assert!(approx(m.ast_pct, 5.0 / 16.0 * 100.0));
    }

    #[test]
    fn test_team_context_fallback_minutes() {
        let ctx = TeamContext { game_minutes: 12.0, ..Default::default() };
        assert!(approx(ctx.team_minutes(), 60.0));
    }

    #[test]
    fn test_box_composite_baseline() {
        let calc = AdvancedStatsCalculator::new(MetricsConfig { bpm_baseline: 5.0 });
        let team = StatLine { pts: 10, fga: 10, ..Default::default() };
        let ctx = TeamContext { team, opponent: StatLine::default(), game_minutes: 12.0 };
        let m = calc.derive(&team, EntityKind::Team, Some(&ctx));
        assert!(approx(m.box_plus_minus, game_score(&team) / 10.0 * 100.0 - 5.0));
    }
}
