use vocal_tract::{Tract, TractGeometry, TractParms};

fn main() {
    run_impulse_response();
    run_coefficients();
}

fn tract() -> Tract {
    match Tract::new(TractGeometry::default(), TractParms::default()) {
        Ok(tract) => tract,
        Err(error) => {
            println!("Error: {error}");
            std::process::exit(1);
        }
    }
}

fn run_impulse_response() {
    let mut tract = tract();
    let mut excitation = [0.0; 128];
    excitation[0] = 1.0;
    match tract.process(&excitation, &[0.0; 128], 128) {
        Ok(out) => println!("Impulse response: {:#?}", &out[0..20]),
        Err(error) => {
            println!("Error: {error}");
            std::process::exit(1);
        }
    }
}

fn run_coefficients() {
    let tract = tract();
    println!("Reflections: {:#?}", &tract.coefficients().buccal);
}
