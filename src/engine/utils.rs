/// Borrows `items[first]` mutably together with an optional distinct second
/// element. A second index equal to the first yields `None`.
pub(super) fn pair_mut<T>(
    items: &mut [T],
    first: usize,
    second: Option<usize>,
) -> (&mut T, Option<&mut T>) {
    match second {
        Some(second) if second != first && second < items.len() => {
            if first < second {
                let (head, tail) = items.split_at_mut(second);
                (&mut head[first], Some(&mut tail[0]))
            } else {
                let (head, tail) = items.split_at_mut(first);
                (&mut tail[0], Some(&mut head[second]))
            }
        }
        _ => (&mut items[first], None),
    }
}

pub(super) fn tile_distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

pub(super) fn ticks_to_ms(ticks: u64, tick_ms: f64) -> u64 {
    (ticks as f64 * tick_ms).round() as u64
}

#[cfg(test)]
mod tests {
    use super::{pair_mut, ticks_to_ms, tile_distance};

    #[test]
    fn pair_mut_returns_both_elements_in_either_order() {
        let mut items = vec![1, 2, 3, 4];
        {
            let (a, b) = pair_mut(&mut items, 0, Some(3));
            *a += 10;
            *b.expect("second") += 20;
        }
        {
            let (a, b) = pair_mut(&mut items, 2, Some(1));
            *a += 100;
            *b.expect("second") += 200;
        }
        assert_eq!(items, vec![11, 202, 103, 24]);
    }

    #[test]
    fn pair_mut_rejects_aliasing_and_out_of_range() {
        let mut items = vec![1, 2];
        let (_, same) = pair_mut(&mut items, 1, Some(1));
        assert!(same.is_none());
        let (_, missing) = pair_mut(&mut items, 0, Some(5));
        assert!(missing.is_none());
    }

    #[test]
    fn conversions() {
        assert_eq!(tile_distance((0.0, 0.0), (3.0, 4.0)), 5.0);
        assert_eq!(ticks_to_ms(60, 1000.0 / 60.0), 1000);
    }
}
