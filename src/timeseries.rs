use std::collections::HashSet;

use chrono::DateTime;
use chrono::Duration;
use chrono::NaiveTime;
use chrono::Utc;
use clap::ValueEnum;
use rand::seq::index;
use rand::Rng;
use rand_distr::Distribution;
use rand_distr::Pareto;

use crate::error::GenError;
use crate::error::Result;

/// Days of backfill produced by [`Mode::Hist`].
pub const HIST_DAYS: i64 = 10;
/// Fraction of the dense grid kept as stats rows; the rest models missing
/// telemetry.
pub const STATS_KEEP_FRAC: f64 = 0.75;
/// Per-player sampling rate for payment rows.
pub const PAYMENTS_SAMPLE_FRAC: f64 = 0.01;
/// Reference player that always keeps its full payment history, so the demo
/// queries have something to show.
pub const REFERENCE_PLAYER_ID: &str = "ZA9";

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Backfill: the 10 full days preceding today, replacing any existing
    /// dataset.
    Hist,
    /// Incremental: from midnight today up to now, appended to an existing
    /// dataset.
    Curr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsRecord {
    pub player_id: String,
    pub ts: DateTime<Utc>,
    pub win_loss_ratio: f64,
    pub games_played: f64,
    pub time_in_game: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    pub player_id: String,
    pub ts: DateTime<Utc>,
    pub amount: f64,
    pub transactions: f64,
}

/// Resolves the hourly timestamp sequence for a mode.
///
/// `Hist` covers the `HIST_DAYS` full days strictly preceding the current
/// day; `Curr` covers midnight of the current day up to the last whole hour
/// before `now`, inclusive.
pub fn resolve_window(mode: Mode, now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    match mode {
        Mode::Hist => {
            let start = midnight - Duration::days(HIST_DAYS);
            (0..HIST_DAYS * 24)
                .map(|h| start + Duration::hours(h))
                .collect()
        }
        Mode::Curr => {
            let mut timestamps = Vec::new();
            let mut t = midnight;
            while t <= now {
                timestamps.push(t);
                t += Duration::hours(1);
            }
            timestamps
        }
    }
}

/// Players whose full candidate row set is kept in the payments stream: the
/// first id in sorted order plus the fixed reference player.
pub fn guaranteed_players(player_ids: &[String]) -> HashSet<String> {
    let mut guaranteed = HashSet::new();
    if let Some(first) = player_ids.first() {
        guaranteed.insert(first.clone());
    }
    guaranteed.insert(REFERENCE_PLAYER_ID.to_string());
    guaranteed
}

/// Builds the stats and payments streams for one run.
///
/// The candidate universe is the dense `player_ids` x `timestamps` grid in
/// grid order. Payment rows are derived first (full set for guaranteed
/// players, `PAYMENTS_SAMPLE_FRAC` otherwise), then the grid is subsampled
/// to `STATS_KEEP_FRAC`, then feature values are drawn per row. All draws
/// consume `rng` in this fixed order, so a seed fully determines the output;
/// reordering the draws is a breaking change for seed reproducibility.
pub fn synthesize<R: Rng>(
    rng: &mut R,
    timestamps: &[DateTime<Utc>],
    player_ids: &[String],
    guaranteed: &HashSet<String>,
) -> Result<(Vec<StatsRecord>, Vec<PaymentRecord>)> {
    let hours = timestamps.len();

    // (player index, hour index) pairs, ordered by grid position
    let mut payment_rows: Vec<(usize, usize)> = Vec::new();
    for (p, id) in player_ids.iter().enumerate() {
        if guaranteed.contains(id) {
            payment_rows.extend((0..hours).map(|h| (p, h)));
        } else {
            let count = (PAYMENTS_SAMPLE_FRAC * hours as f64).round() as usize;
            let mut picked = index::sample(rng, hours, count).into_vec();
            picked.sort_unstable();
            payment_rows.extend(picked.into_iter().map(|h| (p, h)));
        }
    }

    let grid_len = player_ids.len() * hours;
    let keep = (STATS_KEEP_FRAC * grid_len as f64).round() as usize;
    let mut kept = index::sample(rng, grid_len, keep).into_vec();
    kept.sort_unstable();

    let games_dist = Pareto::<f64>::new(1.0, 2.0)
        .map_err(|err| GenError::General(format!("invalid games_played distribution: {err}")))?;

    let mut stats = Vec::with_capacity(kept.len());
    for row in kept {
        stats.push(StatsRecord {
            player_id: player_ids[row / hours].clone(),
            ts: timestamps[row % hours],
            win_loss_ratio: rng.gen_range(0.0..1.0),
            games_played: ((games_dist.sample(rng) - 1.0) * 100.0).round() + 1.0,
            time_in_game: rng.gen_range(1.0..3600.0),
        });
    }

    let mut payments = Vec::with_capacity(payment_rows.len());
    for (p, h) in payment_rows {
        payments.push(PaymentRecord {
            player_id: player_ids[p].clone(),
            ts: timestamps[h],
            amount: (rng.gen_range(10.0f64..1000.0) * 100.0).round() / 100.0,
            transactions: rng.gen_range(1.0f64..10.0).round(),
        });
    }

    Ok((stats, payments))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 13, 45, 11).unwrap()
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_hist_window_covers_ten_full_days() {
        let window = resolve_window(Mode::Hist, noon());

        assert_eq!(window.len(), 240);
        assert_eq!(window[0], Utc.with_ymd_and_hms(2024, 5, 5, 0, 0, 0).unwrap());
        assert_eq!(
            *window.last().unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 14, 23, 0, 0).unwrap()
        );
        for pair in window.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::hours(1));
        }
    }

    #[test]
    fn test_curr_window_starts_at_midnight() {
        let window = resolve_window(Mode::Curr, noon());

        assert_eq!(window[0], Utc.with_ymd_and_hms(2024, 5, 15, 0, 0, 0).unwrap());
        assert_eq!(
            *window.last().unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 15, 13, 0, 0).unwrap()
        );
        assert_eq!(window.len(), 14);
    }

    #[test]
    fn test_curr_window_at_midnight_has_one_point() {
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 0, 0, 0).unwrap();
        assert_eq!(resolve_window(Mode::Curr, now), vec![now]);
    }

    #[test]
    fn test_guaranteed_players_first_and_reference() {
        let guaranteed = guaranteed_players(&ids(&["AAA", "BBB", "ZZZ"]));

        assert!(guaranteed.contains("AAA"));
        assert!(guaranteed.contains(REFERENCE_PLAYER_ID));
        assert_eq!(guaranteed.len(), 2);
    }

    #[test]
    fn test_stats_subsample_size_and_window() {
        let window = resolve_window(Mode::Hist, noon());
        let players = ids(&["AAA", "BBB"]);
        let guaranteed = guaranteed_players(&players);
        let mut rng = StdRng::seed_from_u64(123);

        let (stats, _) = synthesize(&mut rng, &window, &players, &guaranteed).unwrap();

        // 2 players x 10 days x 24 hours = 480 candidates, 75% kept
        assert_eq!(stats.len(), 360);
        let (start, end) = (window[0], *window.last().unwrap());
        for record in &stats {
            assert!(record.ts >= start && record.ts <= end);
            assert!(players.contains(&record.player_id));
        }
    }

    #[test]
    fn test_payment_sparsity_and_guaranteed_boost() {
        let window = resolve_window(Mode::Hist, noon());
        let players = ids(&["AAA", "BBB", "ZZZ"]);
        let guaranteed = guaranteed_players(&players);
        let mut rng = StdRng::seed_from_u64(123);

        let (_, payments) = synthesize(&mut rng, &window, &players, &guaranteed).unwrap();

        let count = |id: &str| payments.iter().filter(|r| r.player_id == id).count();
        // guaranteed player keeps its full 240-row candidate set
        assert_eq!(count("AAA"), 240);
        // non-guaranteed players keep round(1% of 240) = 2 rows
        assert_eq!(count("BBB"), 2);
        assert_eq!(count("ZZZ"), 2);
        assert_eq!(payments.len(), 244);
    }

    #[test]
    fn test_payment_rows_ordered_by_grid_position() {
        let window = resolve_window(Mode::Hist, noon());
        let players = ids(&["AAA", "BBB"]);
        let guaranteed = guaranteed_players(&players);
        let mut rng = StdRng::seed_from_u64(7);

        let (_, payments) = synthesize(&mut rng, &window, &players, &guaranteed).unwrap();

        for pair in payments.windows(2) {
            let ordered = pair[0].player_id < pair[1].player_id
                || (pair[0].player_id == pair[1].player_id && pair[0].ts < pair[1].ts);
            assert!(ordered);
        }
    }

    #[test]
    fn test_feature_value_ranges() {
        let window = resolve_window(Mode::Hist, noon());
        let players = ids(&["AAA", "BBB"]);
        let guaranteed = guaranteed_players(&players);
        let mut rng = StdRng::seed_from_u64(123);

        let (stats, payments) = synthesize(&mut rng, &window, &players, &guaranteed).unwrap();

        for record in &stats {
            assert!((0.0..1.0).contains(&record.win_loss_ratio));
            assert!(record.games_played >= 1.0);
            assert_eq!(record.games_played, record.games_played.round());
            assert!((1.0..3600.0).contains(&record.time_in_game));
        }
        for record in &payments {
            assert!((10.0..=1000.0).contains(&record.amount));
            assert_eq!(record.amount, (record.amount * 100.0).round() / 100.0);
            assert!((1.0..=10.0).contains(&record.transactions));
            assert_eq!(record.transactions, record.transactions.round());
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let window = resolve_window(Mode::Hist, noon());
        let players = ids(&["AAA", "BBB", "ZZZ"]);
        let guaranteed = guaranteed_players(&players);

        let mut rng1 = StdRng::seed_from_u64(123);
        let mut rng2 = StdRng::seed_from_u64(123);
        let out1 = synthesize(&mut rng1, &window, &players, &guaranteed).unwrap();
        let out2 = synthesize(&mut rng2, &window, &players, &guaranteed).unwrap();

        assert_eq!(out1, out2);
    }

    #[test]
    fn test_empty_player_set_yields_empty_streams() {
        let window = resolve_window(Mode::Hist, noon());
        let guaranteed = guaranteed_players(&[]);
        let mut rng = StdRng::seed_from_u64(123);

        let (stats, payments) = synthesize(&mut rng, &window, &[], &guaranteed).unwrap();

        assert!(stats.is_empty());
        assert!(payments.is_empty());
    }
}
