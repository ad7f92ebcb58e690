// Demo: synthetic Raman spectra -> preprocessing -> PCA -> charts on disk.
//
// Run with `cargo run --example raman_workflow -- <output-dir>`.

use std::env;
use std::path::PathBuf;

use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use spectral_pca::plot::{save_plot, LoadingsOptions, ScoresOptions, ScreeOptions};
use spectral_pca::preprocessing::{remove_background, smoothing, BackgroundKind, BackgroundOptions, SmoothingMode};
use spectral_pca::{Pca, SpectralTable};

fn synthetic_spectra() -> spectral_pca::Result<SpectralTable> {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let axis = Array1::linspace(200.0, 1800.0, 801);
    let bands = [(520.0, 12.0), (1001.0, 8.0), (1450.0, 20.0), (1600.0, 15.0)];
    let n_samples = 24;

    let data = Array2::from_shape_fn((n_samples, axis.len()), |(i, j)| {
        let x = axis[j];
        let group = (i % 3) as f64;
        let signal: f64 = bands
            .iter()
            .enumerate()
            .map(|(b, (centre, width))| {
                let height = 1.0 + group * (b as f64 % 2.0) + 0.3 * (b as f64);
                height * (-(x - centre).powi(2) / (2.0 * width * width)).exp()
            })
            .sum();
        let fluorescence = 2.0 + 1e-3 * x + 4e-7 * x * x;
        signal + fluorescence + rng.gen_range(-0.03..0.03)
    });

    let samples = (0..n_samples).map(|i| format!("G{}-{:02}", i % 3, i)).collect();
    SpectralTable::new(samples, axis, data)
}

fn main() -> spectral_pca::Result<()> {
    env_logger::init();
    let output_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("figures"));

    let raw = synthetic_spectra()?;
    let background = BackgroundOptions {
        n: 40,
        kind: BackgroundKind::Snip,
        ..Default::default()
    };
    let cleaned = raw
        .cut(300.0, 1750.0)?
        .map_spectra(|y| smoothing(y, 11, 3, 0, SmoothingMode::Interp))?
        .map_spectra(|y| remove_background(y, &background))?;

    let pca = Pca::new(&cleaned, Some(4))?;
    println!("{}", pca.explain());

    save_plot(&pca.scree_plot(&ScreeOptions::default())?, output_dir.join("scree.svg"))?;
    save_plot(&pca.scores_plot(&ScoresOptions::default())?, output_dir.join("scores.svg"))?;
    for (i, chart) in pca
        .loadings_plot_all(&LoadingsOptions {
            size: (1300, 600),
            ..Default::default()
        })?
        .iter()
        .enumerate()
    {
        save_plot(chart, output_dir.join(format!("loadings_pc{}.svg", i + 1)))?;
    }
    Ok(())
}
