#[macro_use]
mod common;

#[cfg(test)]
mod constructor {
    tests! {
        init_params in constructor is OK
        "3"
        "4"
    }

    tests! {
        returns_this in constructor is OK
        "Foo instance"
    }

    tests! {
        reinvoke in constructor is OK
        "Foo instance"
    }

    tests! {
        arity in constructor is ERR(70)
        "[line 6:8] Error at ')': Expected 2 arguments but got 1"
    }

    tests! {
        return_value in constructor is ERR(65)
        "[line 3:5] Error at 'return': Cannot return a value from an initializer"
    }
}
