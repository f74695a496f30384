use anyhow::Result;
use chrono::NaiveDate;
use proptest::prelude::*;
use surveysync::export::ExportWindow;
use surveysync::time::{local_day_end_ms, local_day_start_ms, start_of_today_ms};
use surveysync::{live, SurveyTable};

#[path = "util.rs"]
mod util;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[tokio::test]
async fn single_day_window_includes_end_of_day_records() -> Result<()> {
    let store = util::memory_store().await?;
    let report_day = day(2024, 1, 15);
    // 23:59:59.900 local time on the report day.
    let late = local_day_start_ms(report_day) + 86_399_900;
    util::seed_surveyor_at(&store, late, "synced").await?;

    let window = ExportWindow {
        start: Some(report_day),
        end: Some(report_day),
    };
    let (start, end) = window.resolve();
    let records = store.surveyors_in_range(start, end).await?;
    assert_eq!(records.len(), 1);
    Ok(())
}

#[tokio::test]
async fn range_bounds_are_inclusive_on_both_sides() -> Result<()> {
    let store = util::memory_store().await?;
    let report_day = day(2024, 1, 15);
    let start = local_day_start_ms(report_day);
    let end = local_day_end_ms(report_day);
    util::seed_regular_at(&store, start, "synced").await?;
    util::seed_regular_at(&store, end, "synced").await?;
    util::seed_regular_at(&store, start - 1, "synced").await?;
    util::seed_regular_at(&store, end + 1, "synced").await?;

    let records = store.regular_responses_in_range(start, end).await?;
    assert_eq!(records.len(), 2);
    Ok(())
}

#[tokio::test]
async fn submissions_today_excludes_yesterday_at_2359() -> Result<()> {
    let store = util::memory_store().await?;
    let today = start_of_today_ms();
    util::seed_regular_at(&store, today - 60_000, "synced").await?;
    util::seed_regular_at(&store, today + 1_000, "synced").await?;
    util::seed_regular_at(&store, today + 2_000, "synced").await?;

    assert_eq!(live::submissions_today(&store).await?, 2);
    Ok(())
}

#[tokio::test]
async fn counts_do_not_materialize_rows() -> Result<()> {
    let store = util::memory_store().await?;
    for n in 0..25 {
        util::seed_event_at(&store, 1_000 + n, "pending").await?;
    }
    assert_eq!(
        store.count_created_since(SurveyTable::EventResponses, 0).await?,
        25
    );
    assert_eq!(live::pending_count(&store).await?, 25);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Any creation time inside the report day is returned by the
    /// single-day window; a shifted copy outside the day never is.
    #[test]
    fn any_offset_within_the_day_is_included(offset_ms in 0i64..86_400_000) {
        let rt = tokio::runtime::Runtime::new().expect("runtime");
        rt.block_on(async {
            let store = util::memory_store().await.expect("store");
            let report_day = day(2024, 1, 15);
            let start = local_day_start_ms(report_day);
            let end = local_day_end_ms(report_day);
            let created = start + offset_ms.min(86_399_999);
            util::seed_surveyor_at(&store, created, "synced").await.expect("seed");
            util::seed_surveyor_at(&store, start - 1 - offset_ms, "synced")
                .await
                .expect("seed early");
            util::seed_surveyor_at(&store, end + 1 + offset_ms, "synced")
                .await
                .expect("seed late");

            let records = store.surveyors_in_range(start, end).await.expect("range");
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].created_at, created);
        });
    }
}
