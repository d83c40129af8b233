#[macro_use]
mod common;

#[cfg(test)]
mod r#while {
    tests! {
        countdown in while is OK
        "3"
        "2"
        "1"
    }

    tests! {
        false_never_runs in while is OK
        "done"
    }

    tests! {
        accumulate in while is OK
        "10"
    }
}
