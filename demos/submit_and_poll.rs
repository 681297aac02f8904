use anyhow::{Result, bail};
use chrono::NaiveDate;
use harmony_client::{BoundingBox, Client, Collection, JobState, Request, TemporalRange};
use indicatif::{ProgressBar, ProgressStyle};
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Configure the host and Earthdata Login credentials via HARMONY_URL / EDL_USERNAME / EDL_PASSWORD.
    let client = Client::from_env()?;

    let day = |m, d| {
        NaiveDate::from_ymd_opt(2010, m, d)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .expect("valid date")
    };
    let request = Request::new(Collection::new("C1940468263-POCLOUD"))
        .with_spatial(BoundingBox::new(-107.0, 40.0, -105.0, 42.0)?)
        .with_temporal(TemporalRange::new(day(12, 1), day(12, 31))?);

    let job_id = client.submit(&request)?;
    println!("Submitted job {job_id}");

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {wide_bar} {pos}% {msg}")?
            .progress_chars("=>-"),
    );

    // The client performs one request per call; polling is up to the caller.
    loop {
        let status = client.job_status(&job_id)?;
        pb.set_position(u64::from(status.progress));
        pb.set_message(format!("{:?}", status.status));

        if status.status.is_terminal() {
            pb.finish();
            match status.status {
                JobState::Successful | JobState::CompleteWithErrors => {
                    println!("{}", status.message);
                    return Ok(());
                }
                other => bail!("job {job_id} ended as {other:?}: {}", status.message),
            }
        }
        thread::sleep(Duration::from_secs(2));
    }
}
