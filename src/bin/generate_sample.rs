use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

struct SampleTrack {
    genre: &'static str,
    /// Kept as text so a malformed value can be written to the CSV.
    year: String,
    popularity: i64,
    energy: f64,
    danceability: f64,
}

/// Per genre: (energy centre, danceability centre, base popularity).
const GENRES: [(&str, f64, f64, f64); 5] = [
    ("Pop", 0.65, 0.72, 65.0),
    ("Rock", 0.80, 0.48, 50.0),
    ("Hip-Hop", 0.62, 0.80, 60.0),
    ("Jazz", 0.35, 0.55, 35.0),
    ("Electronic", 0.85, 0.70, 55.0),
];

const TRACKS_PER_GENRE_YEAR: usize = 4;

fn generate(rng: &mut SimpleRng) -> Vec<SampleTrack> {
    let mut tracks = Vec::new();
    for year in 2015..=2022 {
        for &(genre, energy, dance, base) in &GENRES {
            for _ in 0..TRACKS_PER_GENRE_YEAR {
                let trend = (year - 2015) as f64 * 1.5;
                tracks.push(SampleTrack {
                    genre,
                    year: year.to_string(),
                    popularity: (base + trend + rng.range(-15.0, 15.0)).clamp(0.0, 100.0) as i64,
                    energy: (energy + rng.range(-0.2, 0.2)).clamp(0.0, 1.0),
                    danceability: (dance + rng.range(-0.2, 0.2)).clamp(0.0, 1.0),
                });
            }
        }
    }
    // One malformed year so the degraded path shows up in demos.
    if let Some(t) = tracks.get_mut(7) {
        t.year = "unknown".to_string();
    }
    tracks
}

fn write_csv(path: &Path, tracks: &[SampleTrack]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(["genre", "year", "popularity", "energy", "danceability"])?;
    for t in tracks {
        writer.write_record([
            t.genre.to_string(),
            t.year.clone(),
            t.popularity.to_string(),
            format!("{:.3}", t.energy),
            format!("{:.3}", t.danceability),
        ])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

/// Parquet keeps `year` typed, so the malformed row becomes a null.
fn write_parquet(path: &Path, tracks: &[SampleTrack]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("genre", DataType::Utf8, false),
        Field::new("year", DataType::Int64, true),
        Field::new("popularity", DataType::Int64, false),
        Field::new("energy", DataType::Float64, false),
        Field::new("danceability", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(
                tracks.iter().map(|t| t.genre).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(
                tracks
                    .iter()
                    .map(|t| t.year.parse::<i64>().ok())
                    .collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(
                tracks.iter().map(|t| t.popularity).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                tracks.iter().map(|t| t.energy).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                tracks.iter().map(|t| t.danceability).collect::<Vec<_>>(),
            )),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let stem = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_tracks".to_string());
    let csv_path = PathBuf::from(format!("{stem}.csv"));
    let parquet_path = PathBuf::from(format!("{stem}.parquet"));

    let mut rng = SimpleRng::new(42);
    let tracks = generate(&mut rng);

    write_csv(&csv_path, &tracks)?;
    write_parquet(&parquet_path, &tracks)?;
    log::info!("Generated {} tracks across {} genres", tracks.len(), GENRES.len());

    println!(
        "Wrote {} tracks to {} and {}",
        tracks.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
