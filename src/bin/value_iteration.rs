use std::env;
use std::thread;
use std::time::Duration;

use grid_mdp::{GridModel, GridRewards, SweepObserver, ValueIteration, ValueIterationConfig};
use ndarray::ArrayView2;

const SAMPLE_MAZE: &str = "\
...*..G
.*.*.x.
.*...*.
...x...
";

/// Redraws the value matrix after every sweep, pausing between frames.
struct TerminalRenderer {
    pause: Duration,
}

impl SweepObserver for TerminalRenderer {
    fn on_sweep(&mut self, sweep: usize, values: ArrayView2<'_, f64>, biggest_change: f64) {
        // Clear the screen and move the cursor home.
        print!("\x1B[2J\x1B[1;1H");
        println!("Iteration count: {} (biggest change {:.2})", sweep, biggest_change);
        println!("{:.2}", values);
        thread::sleep(self.pause);
    }
}

fn main() -> grid_mdp::Result<()> {
    let rewards = GridRewards::default();
    let grid = match env::args().nth(1) {
        Some(path) => GridModel::from_path(path, &rewards)?,
        None => GridModel::parse(SAMPLE_MAZE, &rewards)?,
    };

    let mut engine = ValueIteration::new(grid, ValueIterationConfig::default())?;
    let convergence = if env::var_os("GRID_MDP_VISUALIZE").is_some() {
        engine.run_with(&mut TerminalRenderer {
            pause: Duration::from_secs(1),
        })?
    } else {
        engine.run()?
    };

    println!(
        "Converged after {} sweeps ({:?})",
        convergence.sweeps, convergence.elapsed
    );
    print!("{}", engine.model());
    Ok(())
}
