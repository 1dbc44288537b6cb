use hound::{SampleFormat, WavSpec, WavWriter};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use vocal_tract::{
    Frication, NoiseField, Tract, TractGeometry, TractParms, VelumCoefficients, area,
};

const SAMPLE_RATE: u32 = 48_000;
const BLOCK_SIZE: usize = 128;
const F0: f32 = 120.0;

/// A crude glottal pulse train: a raised-cosine opening followed by a closed phase.
fn pulse_train(phase: &mut f32, jitter: f32, out: &mut [f32]) {
    for o in out {
        *phase += F0 * (1.0 + jitter) / SAMPLE_RATE as f32;
        if *phase >= 1.0 {
            *phase -= 1.0;
        }
        *o = if *phase < 0.6 {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * *phase / 0.6).cos())
        } else {
            0.0
        };
    }
}

fn run_render_vowel() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = SmallRng::seed_from_u64(69);
    let field = NoiseField::from_rng(&mut rng);

    let geometry = TractGeometry::default();
    let v = vocal_tract::VELUM_INDEX;
    let parms = TractParms {
        velum: VelumCoefficients::from_areas(
            area(geometry.buccal[v - 1]),
            area(geometry.buccal[v]),
            area(geometry.nasal[0]),
        ),
        frication: Some(Frication {
            position: 36.5,
            diameter: 0.6,
        }),
        ..TractParms::default()
    };
    let mut tract = Tract::new(geometry.clone(), parms)?;

    // close towards an /u/-like shape halfway through
    let mut target = geometry;
    for d in &mut target.buccal[30..40] {
        *d = 1.0;
    }

    let mut wav = WavWriter::create(
        "out.wav",
        WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        },
    )?;

    let mut phase = 0.0;
    let mut excitation = [0.0; BLOCK_SIZE];
    let mut noise = [0.0; BLOCK_SIZE];
    let blocks = SAMPLE_RATE as usize * 2 / BLOCK_SIZE;
    for block in 0..blocks {
        if block == blocks / 2 {
            tract.set_target(target.clone())?;
        }
        pulse_train(&mut phase, rng.random_range(-0.01..=0.01), &mut excitation);
        field.fill(&mut noise, (block * BLOCK_SIZE) as f64, 1.0, 0.0);
        for sample in tract.process(&excitation, &noise, BLOCK_SIZE)? {
            wav.write_sample(sample * 0.1)?;
        }
        tract.articulate(BLOCK_SIZE as f32 / SAMPLE_RATE as f32)?;
    }
    wav.finalize()?;
    Ok(())
}

fn main() {
    if let Err(error) = run_render_vowel() {
        println!("Error: {error}");
        std::process::exit(1);
    }
}
