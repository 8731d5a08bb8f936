//! Recursive towers of Hanoi over three pegs.

use stepwise_trace::{Step, StepKind};

use super::Recorder;

/// Move `disks` disks from peg 0 to peg 2.
pub(crate) fn solve(disks: u32) -> Vec<Step> {
    let mut rec = Recorder::default();
    shift(disks, 0, 2, 1, &mut rec);
    rec.finish()
}

fn shift(disk: u32, from: usize, to: usize, via: usize, rec: &mut Recorder) {
    if disk == 0 {
        return;
    }
    shift(disk - 1, from, via, to, rec);
    rec.note(
        StepKind::Move {
            item: disk,
            from,
            to,
        },
        format!("move disk {disk} from peg {from} to peg {to}"),
    );
    shift(disk - 1, via, to, from, rec);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_count_is_minimal() {
        for disks in 1..=6 {
            assert_eq!(solve(disks).len(), (1 << disks) - 1);
        }
    }

    #[test]
    fn smallest_disk_moves_first() {
        let steps = solve(3);
        assert_eq!(
            steps[0].kind,
            StepKind::Move {
                item: 1,
                from: 0,
                to: 2
            }
        );
        assert_eq!(steps[0].note.as_deref(), Some("move disk 1 from peg 0 to peg 2"));
    }
}
