#![allow(dead_code)]

use gifting::roster::{DataStore, Family, Person};

/// Families sized by `sizes`, people named p0, p1, ... in file order.
pub fn families(sizes: &[usize]) -> DataStore {
    let mut k = 0;
    let fams = sizes
        .iter()
        .map(|&n| {
            let members = (0..n)
                .map(|_| {
                    let p = Person::new(format!("p{k}"));
                    k += 1;
                    p
                })
                .collect();
            Family::new(members)
        })
        .collect();
    DataStore::new(fams)
}

/// Same layout as `families`, with a deterministic, repeat-heavy history of
/// `years` gifts per person ending in 2021. Gifts that would stay inside a
/// family are simply not recorded.
pub fn with_history(sizes: &[usize], years: i32, salt: usize) -> DataStore {
    let mut store = families(sizes);
    let family_of: Vec<usize> = store.people().map(|(at, _)| at.family).collect();
    let n = family_of.len();
    let names: Vec<String> = store.people().map(|(_, p)| p.name.clone()).collect();

    let mut g = 0;
    for fam in &mut store.families {
        for p in &mut fam.members {
            for y in (2022 - years)..2022 {
                let yy = y as usize;
                let r = (g * 5 + yy * 3 + (yy * yy + salt) % 7 + salt) % n;
                if family_of[r] != family_of[g] {
                    p.history.push(gifting::History {
                        recipient: names[r].clone(),
                        year: y,
                    });
                }
            }
            g += 1;
        }
    }
    store
}

pub fn two_by_two() -> DataStore {
    DataStore::new(vec![
        Family::new(vec![Person::new("A"), Person::new("B")]),
        Family::new(vec![Person::new("C"), Person::new("D")]),
    ])
}
