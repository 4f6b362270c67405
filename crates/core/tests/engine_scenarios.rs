use chrono::NaiveDate;
use fieldsales_core::{
    by_venue, evaluate_achievement, evaluate_event, rollup_event, rollup_staff, CategoryTotals,
    DailyRecord, EventId, Metric, Narrative, SalesCounters, SalesEvent, TargetRow,
};
use rust_decimal::Decimal;

fn target(id: &str, venue: &str, date: (i32, u32, u32), targets: CategoryTotals) -> TargetRow {
    TargetRow {
        event_id: EventId(id.to_string()),
        venue: venue.to_string(),
        team: "Kanto".to_string(),
        event_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("valid date"),
        targets,
        narrative: Narrative::default(),
    }
}

fn mnp_rows(staff: &str, amount: u64) -> Vec<DailyRecord> {
    vec![DailyRecord::new(staff, 1, SalesCounters { au_mnp_sp1: amount, ..Default::default() })]
}

#[test]
fn single_staff_over_two_days_rolls_up_to_both_levels() {
    let records = vec![
        DailyRecord::new(
            "Tanaka",
            1,
            SalesCounters { au_mnp_sp1: 2, au_mnp_sp2: 1, ..Default::default() },
        ),
        DailyRecord::new("Tanaka", 2, SalesCounters { au_mnp_sp1: 1, ..Default::default() }),
    ];
    let row = target("EV-A", "Lalaport Funabashi", (2024, 7, 6), CategoryTotals::default());

    let staff = rollup_staff(&records);
    let event = rollup_event(&row, &records, false);

    assert_eq!(staff.len(), 1);
    assert_eq!(staff[0].categories.au_mnp, 4);
    assert_eq!(event.actual.au_mnp, 4);
}

#[test]
fn toggling_cell_up_only_moves_the_headline() {
    let records = vec![DailyRecord::new(
        "Sato",
        1,
        SalesCounters {
            au_mnp_sp1: 6,
            uq_mnp_sp2: 4,
            au_new_sim: 5,
            cell_up_sp1: 3,
            ..Default::default()
        },
    )];
    let row = target("EV-B", "Aeon Kawaguchi", (2024, 7, 13), CategoryTotals::default());

    let on = evaluate_event(&SalesEvent { target: row.clone(), include_cell_up: true }, &records);
    let off = evaluate_event(&SalesEvent { target: row, include_cell_up: false }, &records);

    assert_eq!(on.summary.actual_headline, 18);
    assert_eq!(off.summary.actual_headline, 15);
    assert_eq!(on.staff[0].headline, 18);
    assert_eq!(off.staff[0].headline, 15);
    assert_eq!(on.summary.actual, off.summary.actual);
}

#[test]
fn monthly_rate_skips_events_without_targets() {
    let summaries: Vec<_> = [(10, 12), (0, 5), (20, 15)]
        .into_iter()
        .enumerate()
        .map(|(index, (goal, sold))| {
            let row = target(
                &format!("EV-C{index}"),
                "Venue",
                (2024, 8, 3),
                CategoryTotals { au_mnp: goal, ..Default::default() },
            );
            rollup_event(&row, &mnp_rows("Ito", sold), false)
        })
        .collect();

    let monthly = evaluate_achievement(&summaries);

    assert_eq!(monthly.len(), 1);
    assert_eq!(monthly[0].eligible_count, 2);
    assert_eq!(monthly[0].achieved_count, 1);
    assert_eq!(monthly[0].achievement_rate, 50);
}

#[test]
fn venue_stats_total_and_average_by_headline() {
    let summaries = vec![
        rollup_event(
            &target("EV-D1", "A", (2024, 9, 7), CategoryTotals::default()),
            &mnp_rows("Kato", 100),
            false,
        ),
        rollup_event(
            &target("EV-D2", "A", (2024, 9, 14), CategoryTotals::default()),
            &mnp_rows("Kato", 200),
            false,
        ),
        rollup_event(
            &target("EV-D3", "B", (2024, 9, 21), CategoryTotals::default()),
            &mnp_rows("Kato", 50),
            false,
        ),
    ];

    let stats = by_venue(&summaries, Metric::Headline);

    assert_eq!(stats[0].key, "A");
    assert_eq!(stats[0].total, 300);
    assert_eq!(stats[0].average, Decimal::from(150));
    assert_eq!(stats[1].key, "B");
    assert_eq!(stats[1].total, 50);
    assert_eq!(stats[1].average, Decimal::from(50));
}
