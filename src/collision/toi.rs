use crate::collision::distance::hull_distance;
use crate::collision::shapes::Shape;
use crate::config::{LINEAR_SLOP, MAX_TOI_ROOT_ITERATIONS};
use crate::core::math::Sweep;

/// Swept pair handed to [`calculate_time_of_impact`].
pub struct ToiInput<'a> {
    pub shape_a: &'a Shape,
    pub sweep_a: Sweep,
    pub shape_b: &'a Shape,
    pub sweep_b: Sweep,
    /// Upper bound on the returned time, in normalized step time.
    pub t_max: f32,
}

/// Outcome of a time-of-impact query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToiOutput {
    /// The shapes reach the target separation at normalized time `t`.
    Touching { t: f32 },
    /// The shapes stay separated over the queried interval.
    Separated,
    /// Already past the target separation at the interval start; continuous
    /// collision gives up and leaves the pair to the discrete solver.
    Overlapped,
}

/// Earliest time in `[alpha0, t_max]` at which the swept shapes touch.
///
/// Conservative advancement: at each probe time the hull distance bounds how
/// far the interval can be skipped without risking a missed impact, using the
/// maximum approach speed of the two sweeps. The search therefore never
/// tunnels; if it fails to converge it reports the pair as separated and
/// leaves the discrete solver to handle the overlap.
pub fn calculate_time_of_impact(input: &ToiInput) -> ToiOutput {
    let total_radius = input.shape_a.skin_radius() + input.shape_b.skin_radius();
    let target = LINEAR_SLOP.max(total_radius - 3.0 * LINEAR_SLOP);
    let tolerance = 0.25 * LINEAR_SLOP;

    let sweep_a = input.sweep_a;
    let sweep_b = input.sweep_b;

    // Bound on the approach speed per unit of normalized time.
    let delta_linear = ((sweep_b.c - sweep_b.c0) - (sweep_a.c - sweep_a.c0)).length();
    let angular_bound = (sweep_a.a - sweep_a.a0).abs() * input.shape_a.max_extent()
        + (sweep_b.a - sweep_b.a0).abs() * input.shape_b.max_extent();
    let speed_bound = delta_linear + angular_bound;

    let mut t = 0.0;
    for iteration in 0..MAX_TOI_ROOT_ITERATIONS {
        let xf_a = sweep_a.transform_at(t);
        let xf_b = sweep_b.transform_at(t);
        let separation = hull_distance(input.shape_a, &xf_a, input.shape_b, &xf_b);

        if iteration == 0 && separation < target - tolerance {
            return ToiOutput::Overlapped;
        }
        if separation < target + tolerance {
            return ToiOutput::Touching { t };
        }
        if speed_bound < f32::EPSILON {
            return ToiOutput::Separated;
        }

        t += (separation - target) / speed_bound;
        if t >= input.t_max {
            return ToiOutput::Separated;
        }
    }

    // Ran out of iterations while a gap remains.
    ToiOutput::Separated
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec2;

    fn linear_sweep(from: Vec2, to: Vec2) -> Sweep {
        Sweep {
            c0: from,
            c: to,
            ..Default::default()
        }
    }

    #[test]
    fn head_on_circles_touch_midway() {
        let shape = Shape::circle(0.5);
        let input = ToiInput {
            shape_a: &shape,
            sweep_a: linear_sweep(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0)),
            shape_b: &shape,
            sweep_b: linear_sweep(Vec2::new(5.0, 0.0), Vec2::new(-5.0, 0.0)),
            t_max: 1.0,
        };
        match calculate_time_of_impact(&input) {
            ToiOutput::Touching { t } => {
                // Centers close at 20 units per step; contact at distance 1.
                assert_relative_eq!(t, 0.45, epsilon = 0.01);
            }
            output => panic!("circles must collide, got {output:?}"),
        }
    }

    #[test]
    fn fast_box_hits_static_wall() {
        let bullet = Shape::boxy(0.1, 0.1);
        let wall = Shape::boxy(0.05, 5.0);
        let input = ToiInput {
            shape_a: &bullet,
            sweep_a: linear_sweep(Vec2::new(-4.0, 0.0), Vec2::new(6.0, 0.0)),
            shape_b: &wall,
            sweep_b: linear_sweep(Vec2::new(0.0, 0.0), Vec2::new(0.0, 0.0)),
            t_max: 1.0,
        };
        match calculate_time_of_impact(&input) {
            ToiOutput::Touching { t } => {
                assert!(t > 0.0 && t < 0.45, "impact time {t} out of range");
                // The box front face travels from -3.9 to the wall at -0.05.
                assert_relative_eq!(t, 3.85 / 10.0, epsilon = 0.01);
            }
            output => panic!("box must hit the wall, got {output:?}"),
        }
    }

    #[test]
    fn parallel_motion_stays_separated() {
        let shape = Shape::circle(0.5);
        let input = ToiInput {
            shape_a: &shape,
            sweep_a: linear_sweep(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)),
            shape_b: &shape,
            sweep_b: linear_sweep(Vec2::new(0.0, 5.0), Vec2::new(10.0, 5.0)),
            t_max: 1.0,
        };
        assert_eq!(calculate_time_of_impact(&input), ToiOutput::Separated);
    }

    #[test]
    fn deep_overlap_is_left_to_the_discrete_solver() {
        let shape = Shape::circle(0.5);
        let input = ToiInput {
            shape_a: &shape,
            sweep_a: linear_sweep(Vec2::ZERO, Vec2::ZERO),
            shape_b: &shape,
            sweep_b: linear_sweep(Vec2::new(0.3, 0.0), Vec2::new(0.3, 0.0)),
            t_max: 1.0,
        };
        assert_eq!(calculate_time_of_impact(&input), ToiOutput::Overlapped);
    }

    #[test]
    fn respects_t_max_clip() {
        let shape = Shape::circle(0.5);
        let input = ToiInput {
            shape_a: &shape,
            sweep_a: linear_sweep(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0)),
            shape_b: &shape,
            sweep_b: linear_sweep(Vec2::new(5.0, 0.0), Vec2::new(-5.0, 0.0)),
            t_max: 0.2,
        };
        assert_eq!(calculate_time_of_impact(&input), ToiOutput::Separated);
    }
}
