use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hl_chart::{Chart, NoteEvent, SongMeta};
use hl_engine::{AudioClip, LaneInput, PlayConfig, Session, SimulatedTransport};

const DT: f64 = 1.0 / 60.0;

/// Four lanes of sixteenth notes at 150 BPM with a hold every bar.
fn dense_chart(seconds: f64) -> Chart {
    let step = 60.0 / 150.0 / 4.0;
    let mut notes = Vec::new();
    let mut t = 0.5;
    let mut i = 0u32;
    while t < seconds {
        let lane = (i % 4) as u8;
        if i % 16 == 0 {
            notes.push(NoteEvent::hold(lane, t, step * 3.0));
        } else {
            notes.push(NoteEvent::tap(lane, t));
        }
        t += step;
        i += 1;
    }
    Chart::new(SongMeta::new("bench"), 4, notes)
}

/// Press on every hit time, release just after every note ends.
fn perfect_inputs(chart: &Chart) -> Vec<LaneInput> {
    let mut inputs = Vec::new();
    for n in chart.notes() {
        inputs.push(LaneInput::press(n.lane, n.hit_time));
        inputs.push(LaneInput::release(n.lane, n.end_time() + 0.02));
    }
    inputs.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    inputs
}

fn bench_session_autoplay(c: &mut Criterion) {
    let chart = dense_chart(60.0);
    let inputs = perfect_inputs(&chart);
    c.bench_function("session_60s_autoplay", |b| {
        b.iter(|| {
            let mut session = Session::new(PlayConfig::default(), SimulatedTransport::new(60.0));
            session
                .start(Some(&chart), Some(AudioClip::new(60.0)), 0)
                .unwrap();
            session.update(DT);
            let mut next = 0;
            while session.song_position() < 60.0 {
                let now = session.song_position() + DT;
                while next < inputs.len() && inputs[next].timestamp <= now {
                    session.push_input(inputs[next]);
                    next += 1;
                }
                session.update(DT);
                for event in session.drain_events() {
                    black_box(event);
                }
            }
            black_box(session.score().score())
        })
    });
}

criterion_group!(benches, bench_session_autoplay);
criterion_main!(benches);
