pub mod db;
pub mod init;
pub mod query;

#[cfg(test)]
pub(crate) mod fixtures {
    use species::core::interpolate::linspace;
    use std::fmt::Write as _;
    use std::fs;
    use std::path::{Path, PathBuf};

    pub(crate) const J: &str = "MKO/NSFCam.J";
    pub(crate) const H: &str = "MKO/NSFCam.H";
    pub(crate) const KS: &str = "MKO/NSFCam.Ks";

    pub(crate) const ISOCHRONES: &str = "\
! Evolutionary tracks, solar metallicity
----------------------------------------------------------------------
    t (Gyr) =   0.100
----------------------------------------------------------------------
 M/Ms    Teff(K)  L/Ls   lg(g)  R(Gcm)   D      Li     J      H      K
----------------------------------------------------------------------
 0.0300  2500  -2.80   4.50   1.40   0.90   1.00  12.10  11.60  11.20
 0.0400  2700  -2.60   4.60   1.30   0.80   1.00  11.50  11.00  10.70

    t (Gyr) =   1.000
----------------------------------------------------------------------
 M/Ms    Teff(K)  L/Ls   lg(g)  R(Gcm)   D      Li     J      H      K
----------------------------------------------------------------------
 0.0300  1500  -4.00   5.10   0.70   0.10   1.00  15.00  14.50  14.00
 0.0400  1800  -3.70   5.20   0.68   0.05   1.00  14.00  13.40  13.00
";

    pub(crate) struct InputFiles {
        pub isochrones: PathBuf,
        pub model: PathBuf,
        pub vega: PathBuf,
        pub filters: Vec<(&'static str, PathBuf)>,
    }

    fn box_filter(lower: f64, upper: f64) -> String {
        let mut text = String::from("# wavelength transmission\n");
        for w in linspace(lower - 0.05, upper + 0.05, 13) {
            let t = if w > lower && w < upper { 1.0 } else { 0.0 };
            let _ = writeln!(text, "{} {}", w, t);
        }
        text
    }

    /// Writes an isochrone file, a flat model grid, a Vega spectrum and box-shaped
    /// J, H and Ks filters into `dir`.
    pub(crate) fn write_inputs(dir: &Path) -> InputFiles {
        let isochrones = dir.join("isochrones.txt");
        fs::write(&isochrones, ISOCHRONES).unwrap();

        let mut model = String::from("teff,logg,wavelength,flux\n");
        for teff in [1000.0, 2000.0, 3000.0] {
            for logg in [4.0, 5.0, 5.5] {
                for w in linspace(0.8, 2.6, 37) {
                    let _ = writeln!(model, "{},{},{},{}", teff, logg, w, 1e-3);
                }
            }
        }
        let model_path = dir.join("flat.csv");
        fs::write(&model_path, model).unwrap();

        let mut vega = String::new();
        for w in linspace(0.3, 8.0, 78) {
            let _ = writeln!(vega, "{} {}", w, 3.0e-8 / (w * w));
        }
        let vega_path = dir.join("vega.dat");
        fs::write(&vega_path, vega).unwrap();

        let mut filters = Vec::new();
        for (id, lower, upper) in [(J, 1.1, 1.35), (H, 1.5, 1.8), (KS, 2.0, 2.3)] {
            let path = dir.join(format!("{}.dat", id.replace('/', "_")));
            fs::write(&path, box_filter(lower, upper)).unwrap();
            filters.push((id, path));
        }

        InputFiles {
            isochrones,
            model: model_path,
            vega: vega_path,
            filters,
        }
    }
}
